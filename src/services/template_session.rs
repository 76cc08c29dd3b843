//! 模板会话 - 业务能力层
//!
//! 记录外部引擎中"当前打开的模板"。除 `open` / `info` 外的操作都要求会话已打开，
//! 否则直接返回失败信号，不会调用桥接程序

use crate::infrastructure::{BridgeCommand, BridgeInvoker, BridgeResult, OperationKind};
use crate::services::response_classifier::{classify, parse_entity_list, Outcome};
use crate::utils::truncate_text;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// 模板会话
///
/// 外部引擎只有一个可变的"当前模板"，同一会话上的调用必须串行
pub struct TemplateSession<I> {
    invoker: I,
    current_template: Option<PathBuf>,
}

impl<I: BridgeInvoker> TemplateSession<I> {
    /// 创建新的会话（尚未打开任何模板）
    pub fn new(invoker: I) -> Self {
        Self {
            invoker,
            current_template: None,
        }
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    pub fn current_template(&self) -> Option<&Path> {
        self.current_template.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.current_template.is_some()
    }

    /// 获取桥接环境信息，原样返回输出
    pub async fn info(&self) -> BridgeResult {
        self.invoker.invoke(BridgeCommand::Info).await
    }

    /// 打开模板
    ///
    /// 失败时保留之前的会话状态
    pub async fn open(&mut self, path: &Path) -> bool {
        if !path.exists() {
            error!("❌ 模板文件不存在: {}", path.display());
            return false;
        }

        info!("📂 打开模板: {}", path.display());
        let ok = self
            .run(BridgeCommand::Open {
                path: path.to_path_buf(),
            })
            .await;

        if ok {
            self.current_template = Some(path.to_path_buf());
        }
        ok
    }

    /// 更新对象文本
    pub async fn update_text(&self, entity: &str, text: &str) -> bool {
        if !self.require_open() {
            return false;
        }
        info!("✏️ 更新对象 '{}' 文本: {}", entity, truncate_text(text, 80));
        self.run(BridgeCommand::Update {
            entity: entity.to_string(),
            text: text.to_string(),
        })
        .await
    }

    /// 执行标刻；不指定对象时标刻全部对象
    pub async fn mark(&self, entity: Option<&str>) -> bool {
        if !self.require_open() {
            return false;
        }
        match entity {
            Some(name) => info!("🔥 标刻对象: {}", name),
            None => info!("🔥 标刻全部对象"),
        }
        self.run(BridgeCommand::Mark {
            entity: entity.map(str::to_string),
        })
        .await
    }

    /// 列出当前模板中的对象名
    ///
    /// 调用失败时返回 `None`，与"模板中没有对象"区分开
    pub async fn list_entities(&self) -> Option<Vec<String>> {
        if !self.require_open() {
            return None;
        }
        info!("📋 列出模板中的对象");
        let result = self.invoker.invoke(BridgeCommand::List).await;

        if !classify(OperationKind::List, &result).is_success() {
            error!(
                "❌ list 失败 (退出码 {}{})\n输出: {}\n错误: {}",
                result.exit_code,
                if result.timed_out { "，已超时" } else { "" },
                result.output_text.trim_end(),
                result.error_text.trim_end()
            );
            return None;
        }
        Some(parse_entity_list(&result.output_text))
    }

    /// 另存当前模板
    pub async fn save(&self, path: &Path) -> bool {
        if !self.require_open() {
            return false;
        }
        info!("💾 保存模板到: {}", path.display());
        self.run(BridgeCommand::Save {
            path: path.to_path_buf(),
        })
        .await
    }

    /// 定位红光指示
    pub async fn position_pointer(&self, x: f64, y: f64) -> bool {
        if !self.require_open() {
            return false;
        }
        info!("🔴 红光定位到 ({}, {})", x, y);
        self.run(BridgeCommand::Red { x, y }).await
    }

    fn require_open(&self) -> bool {
        if self.current_template.is_none() {
            error!("❌ 当前没有打开的模板");
            return false;
        }
        true
    }

    async fn run(&self, command: BridgeCommand) -> bool {
        let kind = command.kind();
        let name = command.name();
        let result = self.invoker.invoke(command).await;

        match classify(kind, &result) {
            Outcome::Success => true,
            Outcome::Failure => {
                warn!(
                    "⚠️ {} 失败 (退出码 {}): {}",
                    name,
                    result.exit_code,
                    truncate_text(result.output_text.trim(), 200)
                );
                false
            }
            Outcome::Uncertain => {
                warn!(
                    "⚠️ {} 结果无法判定，按失败处理。输出: {}",
                    name,
                    truncate_text(result.output_text.trim(), 200)
                );
                false
            }
        }
    }
}
