// apps/adc_cli/src/commands/convert.rs

//! 格式/坐标系转换命令

use super::load_mesh;
use adc_geo::BuiltinProjection;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// 转换参数
#[derive(Args)]
pub struct ConvertArgs {
    /// 输入网格
    pub input: PathBuf,

    /// 输出网格，格式由扩展名决定
    pub output: PathBuf,

    /// 配置文件 (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 输入坐标系 EPSG，缺省为 4326
    #[arg(long)]
    pub src_epsg: Option<u32>,

    /// 输出坐标系 EPSG
    #[arg(long)]
    pub epsg: Option<u32>,
}

/// 执行转换命令
pub fn execute(args: ConvertArgs) -> Result<()> {
    let mut mesh = load_mesh(&args.input, args.config.as_deref())?;

    if let Some(src) = args.src_epsg {
        // 4326 为经纬度，其余按平面处理
        mesh.define_projection(src, src == adc_geo::projection::EPSG_WGS84);
    }
    if let Some(dst) = args.epsg {
        let src = mesh.projection().epsg;
        mesh.reproject(&BuiltinProjection, dst)
            .with_context(|| format!("无法从 EPSG:{src} 投影到 EPSG:{dst}"))?;
        info!("已投影: EPSG:{src} -> EPSG:{dst}");
    }

    mesh.write(&args.output)
        .with_context(|| format!("写出网格失败: {}", args.output.display()))?;
    info!("已写出 {}", args.output.display());
    Ok(())
}
