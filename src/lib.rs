//! # EZCAD Batch
//!
//! 从表格读取数据，通过 EZCADBridge 驱动 EZCAD2 逐行批量标刻
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（桥接程序），只暴露能力
//! - `ProcessInvoker` - 每次调用启动一个桥接进程，收集输出，超时强制终止
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个操作
//! - `response_classifier` - 从自由文本输出判定成功/失败/无法判定
//! - `TemplateSession` - 记录当前打开的模板，封装 open / update / mark / list / save / red
//! - `StatusWriter` - 写回表格处理状态
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一行数据"的完整处理流程
//! - `RowCtx` - 上下文封装（行号 + 行标识）
//! - `RowFlow` - 流程编排（更新对象 → 标刻）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量标刻处理器，持有会话和统计
//! - `orchestrator/sheet_processor` - 表格任务处理器，读取表格并写回状态
//!
//! ## 模块结构

pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, BatchError};
pub use infrastructure::{
    BridgeCommand, BridgeInvoker, BridgeResult, OperationKind, ProcessInvoker,
};
pub use models::{BatchReport, BatchStats, CellValue, DataRow, RowOutcome, RowResult};
pub use orchestrator::{process_spreadsheet, BatchProcessor, SheetJob};
pub use services::{Outcome, TemplateSession};
pub use workflow::{RowCtx, RowFlow};
