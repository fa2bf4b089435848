// apps/adc_cli/src/commands/hash.rs

//! 内容哈希命令

use super::load_mesh;
use adc_mesh::HashType;
use anyhow::{anyhow, Result};
use clap::Args;
use std::path::PathBuf;

/// 哈希参数
#[derive(Args)]
pub struct HashArgs {
    /// 网格文件
    pub mesh: PathBuf,

    /// 哈希算法 (md5, sha1, sha256)
    #[arg(long)]
    pub hash_type: Option<String>,

    /// 配置文件 (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// 执行哈希命令
pub fn execute(args: HashArgs) -> Result<()> {
    let mut mesh = load_mesh(&args.mesh, args.config.as_deref())?;
    if let Some(name) = &args.hash_type {
        let ht: HashType = name.parse().map_err(|e| anyhow!("{e}"))?;
        mesh.set_hash_type(ht);
    }
    println!("{}  {}", mesh.hash(false)?, args.mesh.display());
    Ok(())
}
