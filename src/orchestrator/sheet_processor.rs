//! 表格任务处理器 - 编排层
//!
//! ## 职责
//!
//! 把一个表格文件变成一批标刻任务：
//!
//! 1. **资源校验**：表格、模板必须存在
//! 2. **加载数据**：读取第一个工作表，按列映射生成数据行
//! 3. **批量标刻**：委托 `BatchProcessor`
//! 4. **状态写回**：把标刻成功的行标记为已处理

use crate::config::Config;
use crate::error::{AppResult, ResourceError};
use crate::infrastructure::BridgeInvoker;
use crate::models::{load_mapping_file, load_sheet, BatchReport, ColumnMapping};
use crate::orchestrator::batch_processor::BatchProcessor;
use crate::services::StatusWriter;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// 一次表格任务的参数
#[derive(Debug, Clone)]
pub struct SheetJob {
    pub spreadsheet: PathBuf,
    pub template: PathBuf,
    pub output: Option<PathBuf>,
    /// 列映射 JSON 文件，缺省时列名即对象名
    pub mappings: Option<PathBuf>,
    pub update_status: bool,
}

/// 处理一个表格文件
///
/// 资源缺失、表格无法读取时返回错误；批处理级失败记录在报告里
pub async fn process_spreadsheet<I: BridgeInvoker>(
    processor: &mut BatchProcessor<I>,
    config: &Config,
    job: &SheetJob,
) -> AppResult<BatchReport> {
    if !job.spreadsheet.exists() {
        error!("❌ 表格文件不存在: {}", job.spreadsheet.display());
        return Err(ResourceError::SpreadsheetNotFound {
            path: job.spreadsheet.clone(),
        }
        .into());
    }
    if !job.template.exists() {
        error!("❌ 模板文件不存在: {}", job.template.display());
        return Err(ResourceError::TemplateNotFound {
            path: job.template.clone(),
        }
        .into());
    }

    let sheet = load_sheet(&job.spreadsheet)?;

    let mapping = match &job.mappings {
        Some(path) => load_mapping_file(path).await?,
        None => ColumnMapping::identity(vec![
            config.processed_column.clone(),
            config.processed_time_column.clone(),
        ]),
    };

    let rows = sheet.to_data_rows(&mapping, &config.id_column);
    info!("📄 从表格中读取 {} 行待处理数据", rows.len());

    let report = processor
        .process_batch(&job.template, &rows, job.output.as_deref())
        .await;

    if !report.is_success() {
        return Ok(report);
    }

    if job.update_status {
        let writer = StatusWriter::new(
            config.processed_column.clone(),
            config.processed_time_column.clone(),
        );
        match writer.write(&job.spreadsheet, &report.marked_rows()) {
            Ok(n) if n > 0 => info!("✓ 已写回 {} 行处理状态", n),
            Ok(_) => {}
            Err(e) => warn!("⚠️ 写回处理状态失败: {}", e),
        }
    }

    Ok(report)
}
