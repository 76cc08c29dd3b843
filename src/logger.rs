//! 日志初始化
//!
//! 终端输出 + 按日期命名的日志文件（`<log_dir>/ezmark_YYYYMMDD.log`）

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化日志
///
/// `RUST_LOG` 优先；否则使用 `level`，详细模式下为 `debug`
pub fn init(level: &str, verbose: bool, log_dir: &Path) -> Result<PathBuf> {
    let log_file_path = init_log_file(log_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path.display()))?;

    let default_level = if verbose { "debug" } else { level };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("日志系统已初始化")?;

    Ok(log_file_path)
}

/// 创建日志目录并写入本次运行的分隔头
fn init_log_file(log_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("无法创建日志目录: {}", log_dir.display()))?;

    let now = chrono::Local::now();
    let path = log_dir.join(format!("ezmark_{}.log", now.format("%Y%m%d")));

    let log_header = format!(
        "{}\n批量标刻日志 - {}\n{}\n",
        "=".repeat(60),
        now.format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("无法写入日志文件: {}", path.display()))?;
    file.write_all(log_header.as_bytes())?;

    Ok(path)
}
