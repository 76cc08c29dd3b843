//! 批量标刻处理器 - 编排层
//!
//! ## 职责
//!
//! 给定一个模板和有序的数据行，完成整批标刻。
//!
//! ## 核心流程
//!
//! 1. **校验模板**：模板不存在直接返回"模板不存在"，不调用桥接程序
//! 2. **打开模板**：打开失败整批中止，不处理任何行
//! 3. **发现对象**：整批只查询一次对象列表；查询失败时逐个尝试更新字段，没有任何字段更新成功的行不标刻
//! 4. **逐行处理**：严格按输入顺序，委托 `RowFlow`；单行失败（包括 panic）不影响后续行
//! 5. **保存输出**：可选；保存失败只记日志，不改变统计
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有 `TemplateSession` 的模块
//! - **严格串行**：外部引擎只有一个会话状态，不做任何并行分发

use crate::error::BatchError;
use crate::infrastructure::BridgeInvoker;
use crate::models::batch_stats::StatsAccumulator;
use crate::models::{BatchReport, DataRow, RowOutcome, RowResult};
use crate::services::TemplateSession;
use crate::utils::logging::{log_batch_start, log_row_progress, print_final_stats};
use crate::workflow::{RowCtx, RowFlow};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use tracing::{error, info, warn};

/// 批量标刻处理器
pub struct BatchProcessor<I> {
    session: TemplateSession<I>,
}

impl<I: BridgeInvoker> BatchProcessor<I> {
    /// 用桥接调用器创建处理器
    pub fn new(invoker: I) -> Self {
        Self {
            session: TemplateSession::new(invoker),
        }
    }

    pub fn session(&self) -> &TemplateSession<I> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TemplateSession<I> {
        &mut self.session
    }

    /// 处理一批数据
    pub async fn process_batch(
        &mut self,
        template: &Path,
        rows: &[DataRow],
        output: Option<&Path>,
    ) -> BatchReport {
        let mut stats = StatsAccumulator::start();

        if !template.exists() {
            error!("❌ 模板文件不存在: {}", template.display());
            return BatchReport::aborted(
                stats,
                BatchError::TemplateNotFound {
                    path: template.to_path_buf(),
                },
            );
        }

        if !self.session.open(template).await {
            error!("❌ 无法打开模板，整批中止: {}", template.display());
            return BatchReport::aborted(
                stats,
                BatchError::TemplateOpenFailed {
                    path: template.to_path_buf(),
                },
            );
        }

        let flow = match self.session.list_entities().await {
            Some(entities) => {
                info!("📋 模板中的对象: {:?}", entities);
                RowFlow::new(entities)
            }
            None => {
                warn!("⚠️ 无法获取模板对象列表，将逐个尝试更新每个字段");
                RowFlow::undiscovered()
            }
        };

        log_batch_start(template, rows.len());

        let mut outcomes = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let ctx = RowCtx::new(index, rows.len(), row.display_id(index));

            let result = match AssertUnwindSafe(flow.run(&self.session, row, &ctx))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!("{} ❌ 处理过程中发生错误: {}", ctx, message);
                    RowResult::Panicked { message }
                }
            };

            stats.record(result.is_success());
            log_row_progress(&ctx, &result, stats.succeeded());

            outcomes.push(RowOutcome {
                index,
                id: ctx.row_id,
                result,
            });
        }

        let saved = match output {
            Some(path) => {
                let ok = self.session.save(path).await;
                if !ok {
                    warn!("⚠️ 输出模板保存失败: {}", path.display());
                }
                Some(ok)
            }
            None => None,
        };

        let stats = stats.finish();
        print_final_stats(&stats);

        BatchReport {
            stats,
            error: None,
            rows: outcomes,
            saved,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "未知错误".to_string()
    }
}
