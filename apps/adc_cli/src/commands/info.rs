// apps/adc_cli/src/commands/info.rs

//! 网格信息命令

use super::load_mesh;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 网格文件
    pub mesh: PathBuf,

    /// 配置文件 (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 同时统计边表与单元尺度
    #[arg(long)]
    pub topology: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    let mut mesh = load_mesh(&args.mesh, args.config.as_deref())?;

    println!("=== 网格信息 ===");
    println!("标题: {}", mesh.header());
    println!("节点: {}", mesh.num_nodes());
    println!("单元: {}", mesh.num_elements());
    println!(
        "开边界: {} ({} 节点)",
        mesh.num_open_boundaries(),
        mesh.total_open_boundary_nodes()
    );
    println!(
        "陆边界: {} ({} 节点)",
        mesh.num_land_boundaries(),
        mesh.total_land_boundary_nodes()
    );
    println!(
        "编号: 节点{}, 单元{}",
        if mesh.node_ordering_is_logical() { "连续" } else { "不连续" },
        if mesh.element_ordering_is_logical() { "连续" } else { "不连续" },
    );
    let projection = mesh.projection();
    println!(
        "坐标系: EPSG:{} ({})",
        projection.epsg,
        if projection.is_geographic { "经纬度" } else { "平面" }
    );

    if mesh.num_nodes() > 0 {
        let e = mesh.extent()?;
        println!("范围: x [{:.6}, {:.6}], y [{:.6}, {:.6}]", e.xmin, e.xmax, e.ymin, e.ymax);
        println!("高程: [{:.3}, {:.3}]", e.zmin, e.zmax);
    }

    if args.topology {
        let table = mesh.build_face_table()?;
        let n_faces = table.num_faces();
        let n_boundary = table.boundary_faces().count();
        let n_overlap = table.overlapping_edges().len();
        println!("\n=== 拓扑 ===");
        println!("边: {n_faces} (边界边 {n_boundary}, 重叠边 {n_overlap})");

        let sizes = mesh.compute_mesh_size()?;
        let (min, max) = sizes
            .iter()
            .filter(|s| **s > 0.0)
            .fold((f64::INFINITY, 0.0f64), |(lo, hi), &s| (lo.min(s), hi.max(s)));
        if min.is_finite() {
            println!("节点尺度: [{min:.6}, {max:.6}]");
        }
    }

    Ok(())
}
