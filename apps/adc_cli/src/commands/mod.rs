// apps/adc_cli/src/commands/mod.rs

//! 子命令

pub mod check;
pub mod convert;
pub mod export;
pub mod hash;
pub mod info;
pub mod locate;

use adc_mesh::{Mesh, MeshConfig};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// 读取配置（未给出时用默认值）
pub fn load_config(path: Option<&Path>) -> Result<MeshConfig> {
    let config = match path {
        Some(p) => MeshConfig::load(p).with_context(|| format!("读取配置失败: {}", p.display()))?,
        None => MeshConfig::default(),
    };
    config.validate().context("配置无效")?;
    Ok(config)
}

/// 按扩展名读取网格
pub fn load_mesh(path: &Path, config: Option<&Path>) -> Result<Mesh> {
    let config = load_config(config)?;
    let mesh = Mesh::read_with_config(path, config)
        .with_context(|| format!("读取网格失败: {}", path.display()))?;
    info!(
        "已读取 {}: {} 节点, {} 单元",
        path.display(),
        mesh.num_nodes(),
        mesh.num_elements()
    );
    Ok(mesh)
}
