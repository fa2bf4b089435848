// apps/adc_cli/src/commands/locate.rs

//! 点定位命令

use super::load_mesh;
use adc_geo::Point2D;
use anyhow::{bail, Context, Result};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// 点定位参数
#[derive(Args)]
pub struct LocateArgs {
    /// 网格文件
    pub mesh: PathBuf,

    /// 查询点 x
    #[arg(short, allow_negative_numbers = true)]
    pub x: Option<f64>,

    /// 查询点 y
    #[arg(short, allow_negative_numbers = true)]
    pub y: Option<f64>,

    /// 点文件，每行 `x y`
    #[arg(long)]
    pub points: Option<PathBuf>,

    /// 配置文件 (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 覆盖点定位搜索深度
    #[arg(long)]
    pub search_depth: Option<usize>,
}

fn read_points(path: &Path) -> Result<Vec<Point2D>> {
    let text = fs::read_to_string(path).with_context(|| format!("读取点文件失败: {}", path.display()))?;
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .map(|(i, l)| {
            let mut t = l.split(|c: char| c.is_whitespace() || c == ',').filter(|s| !s.is_empty());
            let mut coord = |name: &str| -> Result<f64> {
                t.next()
                    .with_context(|| format!("第 {} 行缺少 {name}", i + 1))?
                    .parse()
                    .with_context(|| format!("第 {} 行 {name} 无法解析", i + 1))
            };
            let x = coord("x")?;
            let y = coord("y")?;
            Ok(Point2D::new(x, y))
        })
        .collect()
}

/// 执行点定位命令
pub fn execute(args: LocateArgs) -> Result<()> {
    let points = match (&args.points, args.x, args.y) {
        (Some(path), _, _) => read_points(path)?,
        (None, Some(x), Some(y)) => vec![Point2D::new(x, y)],
        _ => bail!("需要 -x/-y 或 --points"),
    };

    let mut mesh = load_mesh(&args.mesh, args.config.as_deref())?;
    if let Some(depth) = args.search_depth {
        let mut config = mesh.config().clone();
        config.search_depth = depth;
        mesh.set_config(config);
    }

    let stencils = mesh.raster_stencils(&points)?;
    for (p, stencil) in points.iter().zip(&stencils) {
        match stencil {
            Some(s) => {
                let element = mesh.element(s.element)?;
                let labels: Vec<String> = s
                    .nodes
                    .iter()
                    .zip(&s.weights)
                    .map(|(&n, w)| Ok(format!("{}:{w:.6}", mesh.node(n)?.id)))
                    .collect::<Result<_>>()?;
                println!("{} {} -> 单元 {} [{}]", p.x, p.y, element.id, labels.join(" "));
            }
            None => {
                warn!("点 ({}, {}) 不在网格内", p.x, p.y);
                println!("{} {} -> 未找到", p.x, p.y);
            }
        }
    }
    Ok(())
}
