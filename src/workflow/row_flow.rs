//! 行处理流程 - 流程层
//!
//! 核心职责：定义"一行数据"的完整处理流程
//!
//! 流程顺序：
//! 1. 逐个字段更新模板中同名的对象（模板中没有的字段只警告）
//! 2. 全部更新成功 → 标刻全部对象
//!
//! 对象列表获取失败时，每个字段都尝试更新；一个都没更新成功就不标刻

use std::collections::HashSet;
use tracing::{error, info, warn};

use crate::infrastructure::BridgeInvoker;
use crate::models::{DataRow, RowResult};
use crate::services::TemplateSession;
use crate::workflow::row_ctx::RowCtx;

/// 行处理流程
///
/// - 持有本批模板中发现的对象名（整批只查询一次）；`None` 表示未能获取
/// - 不持有会话，只借用
pub struct RowFlow {
    entities: Option<HashSet<String>>,
}

impl RowFlow {
    /// 用模板中发现的对象名创建流程
    pub fn new(entities: impl IntoIterator<Item = String>) -> Self {
        Self {
            entities: Some(entities.into_iter().collect()),
        }
    }

    /// 对象列表未知时的流程
    pub fn undiscovered() -> Self {
        Self { entities: None }
    }

    pub fn is_discovered(&self) -> bool {
        self.entities.is_some()
    }

    /// 对象列表未知时，任何字段都视为可能存在
    pub fn knows(&self, entity: &str) -> bool {
        self.entities
            .as_ref()
            .map_or(true, |entities| entities.contains(entity))
    }

    pub async fn run<I: BridgeInvoker>(
        &self,
        session: &TemplateSession<I>,
        row: &DataRow,
        ctx: &RowCtx,
    ) -> RowResult {
        info!("{} 开始处理", ctx);

        // ========== 步骤 1: 更新对象 ==========
        let mut failed_entities = Vec::new();
        let mut updated = 0;
        for (entity, value) in &row.fields {
            if !self.knows(entity) {
                warn!("{} ⚠️ 模板中没有对象: {}", ctx, entity);
                continue;
            }

            if session.update_text(entity, &value.to_string()).await {
                updated += 1;
            } else {
                error!("{} ❌ 更新对象失败: {}", ctx, entity);
                failed_entities.push(entity.clone());
            }
        }

        if !failed_entities.is_empty() {
            return RowResult::UpdateFailed {
                entities: failed_entities,
            };
        }

        if !self.is_discovered() && updated == 0 {
            error!("{} ❌ 模板对象未知且没有对象更新成功，跳过标刻", ctx);
            return RowResult::NothingUpdated;
        }

        // ========== 步骤 2: 标刻全部对象 ==========
        if session.mark(None).await {
            info!("{} ✓ 标刻完成", ctx);
            RowResult::Marked
        } else {
            error!("{} ❌ 标刻失败", ctx);
            RowResult::MarkFailed
        }
    }
}
