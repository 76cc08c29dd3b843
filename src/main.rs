use anyhow::Result;
use clap::Parser;
use ezcad_batch::cli::{self, Cli};
use ezcad_batch::logger;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // 加载配置
    let config = cli::build_config(&args)?;

    // 初始化日志
    logger::init(&args.log_level, config.verbose_logging, &config.log_dir)?;

    // 执行命令
    if !cli::run(args, config).await? {
        std::process::exit(1);
    }

    Ok(())
}
