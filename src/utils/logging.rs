/// 日志工具模块
///
/// 提供批处理日志格式化和输出的辅助函数
use crate::models::{BatchStats, RowResult};
use crate::workflow::RowCtx;
use std::path::Path;
use tracing::{info, warn};

/// 记录程序启动信息
///
/// # 参数
/// - `bridge`: 桥接程序路径
/// - `timeout_secs`: 单次调用时限，0 表示不限
pub fn log_startup(bridge: &Path, timeout_secs: u64) {
    info!("{}", "=".repeat(60));
    info!("🚀 EZCAD 批量标刻");
    info!("🔌 桥接程序: {}", bridge.display());
    if timeout_secs > 0 {
        info!("⏱️ 单次调用时限: {} 秒", timeout_secs);
    } else {
        warn!("⚠️ 未设置调用时限，桥接程序挂起时批处理会一直等待");
    }
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `template`: 模板路径
/// - `total`: 数据行总数
pub fn log_batch_start(template: &Path, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始批量标刻: {}", template.display());
    info!("📄 待处理数据: {} 行", total);
    info!("{}", "=".repeat(60));
}

/// 记录单行处理结果
///
/// # 参数
/// - `ctx`: 行上下文
/// - `result`: 处理结果
/// - `succeeded`: 到目前为止成功的行数
pub fn log_row_progress(ctx: &RowCtx, result: &RowResult, succeeded: usize) {
    let mark = if result.is_success() { "✅" } else { "❌" };
    info!(
        "{} {} 进度 {}/{}，已成功 {}",
        ctx,
        mark,
        ctx.index + 1,
        ctx.total,
        succeeded
    );
}

/// 打印最终统计信息
///
/// # 参数
/// - `stats`: 整批统计
pub fn print_final_stats(stats: &BatchStats) {
    info!("\n{}", "=".repeat(60));
    info!("📊 批量标刻完成统计");
    info!("完成时间: {}", stats.end_time.format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", stats.succeeded, stats.total);
    info!("❌ 失败: {}", stats.failed);
    info!("⏱️ 耗时: {:.2} 秒", stats.duration_seconds);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
