// apps/adc_cli/src/commands/check.rs

//! 网格检查命令

use super::load_mesh;
use adc_mesh::MeshChecker;
use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// 检查参数
#[derive(Args)]
pub struct CheckArgs {
    /// 网格文件
    pub mesh: PathBuf,

    /// 配置文件 (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 覆盖节点高程下限
    #[arg(long, allow_negative_numbers = true)]
    pub min_elevation: Option<f64>,

    /// 覆盖堰顶高出地形的最小值
    #[arg(long)]
    pub levee_margin: Option<f64>,
}

/// 执行检查命令
pub fn execute(args: CheckArgs) -> Result<()> {
    let mesh = load_mesh(&args.mesh, args.config.as_deref())?;
    let config = mesh.config();
    let checker = MeshChecker::new(&mesh).with_thresholds(
        args.min_elevation.unwrap_or(config.min_nodal_elevation),
        args.levee_margin.unwrap_or(config.min_crest_over_topography),
    );

    let report = checker.check();
    if report.passed() {
        info!("网格检查通过");
        return Ok(());
    }
    for issue in report.issues() {
        println!("{issue}");
    }
    bail!("网格检查发现 {} 个问题", report.issues().len())
}
