//! 基础设施层
//!
//! 唯一接触外部标刻引擎的地方：定位桥接程序、启动进程、收集输出

pub mod bridge_invoker;
pub mod bridge_locator;

pub use bridge_invoker::{
    BridgeCommand, BridgeInvoker, BridgeResult, OperationKind, ProcessInvoker,
};
pub use bridge_locator::locate_bridge;
