//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量标刻处理器
//! - 持有唯一的 `TemplateSession`
//! - 打开模板、发现对象、逐行处理、可选保存
//! - 输出整批统计信息
//!
//! ### `sheet_processor` - 表格任务处理器
//! - 校验资源、读取表格、应用列映射
//! - 委托 `batch_processor` 标刻
//! - 写回处理状态
//!
//! ## 层次关系
//!
//! ```text
//! sheet_processor (处理表格文件)
//!     ↓
//! batch_processor (处理 Vec<DataRow>)
//!     ↓
//! workflow::RowFlow (处理单行)
//!     ↓
//! services (能力层：session / classifier / status)
//!     ↓
//! infrastructure (基础设施：BridgeInvoker)
//! ```

pub mod batch_processor;
pub mod sheet_processor;

// 重新导出主要类型
pub use batch_processor::BatchProcessor;
pub use sheet_processor::{process_spreadsheet, SheetJob};
