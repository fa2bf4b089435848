// apps/adc_cli/src/commands/export.rs

//! 节点导出命令

use super::load_mesh;
use adc_mesh::export::DelimitedPointWriter;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

/// 导出内容
#[derive(Clone, Copy, ValueEnum)]
pub enum ExportKind {
    /// 全部节点
    Nodes,
    /// 边界节点
    Boundaries,
}

/// 导出参数
#[derive(Args)]
pub struct ExportArgs {
    /// 网格文件
    pub mesh: PathBuf,

    /// 输出 CSV
    pub output: PathBuf,

    /// 导出内容
    #[arg(long, value_enum, default_value = "nodes")]
    pub kind: ExportKind,

    /// 配置文件 (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// 执行导出命令
pub fn execute(args: ExportArgs) -> Result<()> {
    let mesh = load_mesh(&args.mesh, args.config.as_deref())?;
    let file = File::create(&args.output)
        .with_context(|| format!("无法创建 {}", args.output.display()))?;
    let mut writer = DelimitedPointWriter::new(BufWriter::new(file));
    match args.kind {
        ExportKind::Nodes => mesh.export_nodes(&mut writer)?,
        ExportKind::Boundaries => mesh.export_boundary_nodes(&mut writer)?,
    }
    info!("已导出 {}", args.output.display());
    Ok(())
}
