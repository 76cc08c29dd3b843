use crate::error::BatchError;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::Instant;

/// 单行处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowResult {
    /// 全部对象更新成功且标刻完成
    Marked,
    /// 有对象更新失败，未执行标刻
    UpdateFailed { entities: Vec<String> },
    /// 更新成功但标刻失败
    MarkFailed,
    /// 模板对象列表获取失败，且本行没有任何对象更新成功，未执行标刻
    NothingUpdated,
    /// 处理过程中发生 panic
    Panicked { message: String },
}

impl RowResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RowResult::Marked)
    }
}

/// 一行的处理记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOutcome {
    /// 在输入序列中的位置（从 0 开始）
    pub index: usize,
    pub id: String,
    pub result: RowResult,
}

/// 批处理统计
///
/// 只在批处理结束时构建，之后不再修改
#[derive(Debug, Clone, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub duration_seconds: f64,
}

/// 运行中的统计累加器
#[derive(Debug)]
pub(crate) struct StatsAccumulator {
    total: usize,
    succeeded: usize,
    failed: usize,
    start_time: DateTime<Local>,
    started: Instant,
}

impl StatsAccumulator {
    pub(crate) fn start() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            start_time: Local::now(),
            started: Instant::now(),
        }
    }

    pub(crate) fn record(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub(crate) fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub(crate) fn finish(self) -> BatchStats {
        BatchStats {
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            start_time: self.start_time,
            end_time: Local::now(),
            duration_seconds: self.started.elapsed().as_secs_f64(),
        }
    }
}

/// 批处理报告
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub stats: BatchStats,
    /// 批处理级致命错误；存在时没有任何行被处理
    pub error: Option<BatchError>,
    pub rows: Vec<RowOutcome>,
    /// 是否保存了输出模板；未要求保存时为 `None`
    pub saved: Option<bool>,
}

impl BatchReport {
    pub(crate) fn aborted(stats: StatsAccumulator, error: BatchError) -> Self {
        Self {
            stats: stats.finish(),
            error: Some(error),
            rows: Vec::new(),
            saved: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// 人类可读的失败原因
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// 标刻成功的行的位置
    pub fn marked_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .filter(|r| r.result.is_success())
            .map(|r| r.index)
            .collect()
    }
}
