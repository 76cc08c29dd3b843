//! 行处理上下文
//!
//! 封装"我正在处理第几行、它叫什么"这一信息，仅用于日志

use std::fmt::Display;

/// 行处理上下文
#[derive(Debug, Clone)]
pub struct RowCtx {
    /// 行在输入中的位置（从 0 开始）
    pub index: usize,

    /// 本批总行数
    pub total: usize,

    /// 行标识（`id` 字段或 `Row N`）
    pub row_id: String,
}

impl RowCtx {
    /// 创建新的行上下文
    pub fn new(index: usize, total: usize, row_id: String) -> Self {
        Self {
            index,
            total,
            row_id,
        }
    }
}

impl Display for RowCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[行 {}/{} #{}]", self.index + 1, self.total, self.row_id)
    }
}
