// apps/adc_cli/src/main.rs

//! ADCIRC 网格命令行工具
//!
//! 读取、检查、转换网格，查询点所在单元并计算内容哈希。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// ADCIRC 非结构网格工具
#[derive(Parser)]
#[command(name = "adc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "ADCIRC unstructured mesh toolkit", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 显示网格信息
    Info(commands::info::InfoArgs),
    /// 转换网格格式或坐标系
    Convert(commands::convert::ConvertArgs),
    /// 查询点所在单元与插值权重
    Locate(commands::locate::LocateArgs),
    /// 检查网格
    Check(commands::check::CheckArgs),
    /// 计算内容哈希
    Hash(commands::hash::HashArgs),
    /// 导出节点或边界节点
    Export(commands::export::ExportArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // try_init 同时接管 log 宏的输出
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Info(args) => commands::info::execute(args),
        Commands::Convert(args) => commands::convert::execute(args),
        Commands::Locate(args) => commands::locate::execute(args),
        Commands::Check(args) => commands::check::execute(args),
        Commands::Hash(args) => commands::hash::execute(args),
        Commands::Export(args) => commands::export::execute(args),
    }
}
