//! 去标识化批处理主程序

use clap::Parser;
use deident_core::{AppConfig, Result};
use deident_pacs::OrthancClient;
use deident_pipeline::{OrthancArchive, Pipeline, RisReports};
use deident_ris::RisPool;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 批处理命令行参数
#[derive(Parser, Debug)]
#[command(name = "deident-cli")]
#[command(about = "将PACS检查匿名化并附加脱敏报告的批处理工具")]
struct Args {
    /// 配置文件路径（TOML，可选；环境变量DEIDENT__*可覆盖）
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .init();

    // 启动或配置失败以非零码退出；
    // 单个患者的失败只计入汇总，不改变退出码
    if let Err(e) = run(&args).await {
        error!("run aborted: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<()> {
    // 配置仅在进程启动时装载一次
    let config = AppConfig::load(args.config.as_deref())?;
    info!("PACS endpoint: {}", config.pacs.url);
    info!(
        "RIS database: {}@{}:{}/{}",
        config.ris.user, config.ris.host, config.ris.port, config.ris.database
    );

    // 两端可达性探测，失败即中止
    let client = OrthancClient::new(&config.pacs)?;
    client.check().await?;
    let pool = RisPool::connect(&config.ris).await?;

    let archive = OrthancArchive::new(client, &config.pipeline);
    let reports = RisReports::new(pool, &config.pipeline);

    let summary = Pipeline::new(&archive, &reports).run().await?;
    info!(
        "{} patients processed: {} published, {} skipped, {} failed",
        summary.processed(),
        summary.published.len(),
        summary.skipped,
        summary.failed
    );
    Ok(())
}
