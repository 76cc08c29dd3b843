//! 响应判定服务 - 业务能力层
//!
//! 桥接程序只返回自由文本，所有成功/失败短语集中在这里

use crate::infrastructure::{BridgeResult, OperationKind};
use serde::Serialize;

/// 判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    /// 既没有成功短语，也没有已知的失败短语
    Uncertain,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

/// 各操作的成功短语（小写，子串匹配）
///
/// 必须与桥接程序的输出措辞保持一致
pub fn success_phrase(kind: OperationKind) -> Option<&'static str> {
    match kind {
        OperationKind::Open => Some("successfully"),
        OperationKind::Update => Some("updated successfully"),
        OperationKind::Mark => Some("completed"),
        OperationKind::Position => Some("positioned successfully"),
        OperationKind::Save => Some("saved successfully"),
        OperationKind::Info | OperationKind::List => None,
    }
}

/// 已知的失败短语
const FAILURE_PHRASES: &[&str] = &["failed", "error", "not found", "cannot", "invalid", "no ezd"];

/// 判定一次桥接调用的语义结果
pub fn classify(kind: OperationKind, result: &BridgeResult) -> Outcome {
    if result.timed_out {
        return Outcome::Failure;
    }

    let Some(phrase) = success_phrase(kind) else {
        // info / list 没有成功短语，只看进程状态和错误输出
        return if result.succeeded && result.error_text.trim().is_empty() {
            Outcome::Success
        } else {
            Outcome::Failure
        };
    };

    let output = result.output_text.to_lowercase();
    if output.contains(phrase) {
        return Outcome::Success;
    }

    let known_failure = FAILURE_PHRASES.iter().any(|p| output.contains(p));
    if known_failure || !result.succeeded || !result.error_text.trim().is_empty() {
        Outcome::Failure
    } else {
        Outcome::Uncertain
    }
}

/// 解析 `list` 命令的输出
///
/// 形如 `[0] Serial (Type: Text)` 的行是一个对象记录，其它行忽略；
/// 保留输出中的顺序和重复项
pub fn parse_entity_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('['))
        .filter_map(|line| line.split_once(']'))
        .map(|(_, rest)| {
            let rest = rest.trim();
            let name = rest.split("(Type:").next().unwrap_or(rest);
            name.trim().to_string()
        })
        .collect()
}
