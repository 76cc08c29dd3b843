//! 桥接调用器 - 基础设施层
//!
//! 持有唯一的外部资源（EZCADBridge 可执行文件），只暴露"执行一条桥接命令"的能力

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, warn};

/// 桥接命令的操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Info,
    Open,
    Update,
    Mark,
    List,
    Position,
    Save,
}

/// 桥接命令
///
/// 固定词汇表，每条命令的参数个数由类型保证
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCommand {
    Info,
    Open { path: PathBuf },
    Update { entity: String, text: String },
    /// `entity` 为空时标刻模板中的全部对象
    Mark { entity: Option<String> },
    List,
    Red { x: f64, y: f64 },
    Save { path: PathBuf },
}

impl BridgeCommand {
    /// 命令名（桥接程序的第一个参数）
    pub fn name(&self) -> &'static str {
        match self {
            BridgeCommand::Info => "info",
            BridgeCommand::Open { .. } => "open",
            BridgeCommand::Update { .. } => "update",
            BridgeCommand::Mark { .. } => "mark",
            BridgeCommand::List => "list",
            BridgeCommand::Red { .. } => "red",
            BridgeCommand::Save { .. } => "save",
        }
    }

    /// 位置参数
    pub fn args(&self) -> Vec<String> {
        match self {
            BridgeCommand::Info | BridgeCommand::List => Vec::new(),
            BridgeCommand::Open { path } | BridgeCommand::Save { path } => {
                vec![path.to_string_lossy().into_owned()]
            }
            BridgeCommand::Update { entity, text } => vec![entity.clone(), text.clone()],
            BridgeCommand::Mark { entity } => entity.iter().cloned().collect(),
            BridgeCommand::Red { x, y } => vec![x.to_string(), y.to_string()],
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            BridgeCommand::Info => OperationKind::Info,
            BridgeCommand::Open { .. } => OperationKind::Open,
            BridgeCommand::Update { .. } => OperationKind::Update,
            BridgeCommand::Mark { .. } => OperationKind::Mark,
            BridgeCommand::List => OperationKind::List,
            BridgeCommand::Red { .. } => OperationKind::Position,
            BridgeCommand::Save { .. } => OperationKind::Save,
        }
    }

    /// 用于日志的命令行形式
    pub fn display_line(&self) -> String {
        let mut parts = vec![self.name().to_string()];
        parts.extend(self.args());
        parts.join(" ")
    }
}

/// 一次桥接调用的统一结果
///
/// `succeeded` 只反映进程退出状态，与语义上的成功无关
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BridgeResult {
    pub output_text: String,
    pub error_text: String,
    pub exit_code: i32,
    pub succeeded: bool,
    /// 超过调用时限被强制终止
    pub timed_out: bool,
}

impl BridgeResult {
    /// 进程启动本身失败（找不到可执行文件、没有权限等）
    pub fn launch_failed(message: impl Into<String>) -> Self {
        Self {
            output_text: String::new(),
            error_text: message.into(),
            exit_code: -1,
            succeeded: false,
            timed_out: false,
        }
    }

    pub fn timed_out(limit: Duration) -> Self {
        Self {
            output_text: String::new(),
            error_text: format!("桥接命令超时 ({} 秒)，进程已被终止", limit.as_secs()),
            exit_code: -1,
            succeeded: false,
            timed_out: true,
        }
    }

    /// 从已退出进程的输出构建，非法字节按替换字符解码
    pub fn from_output(output: &std::process::Output) -> Self {
        let exit_code = output.status.code().unwrap_or(-1);
        Self {
            output_text: String::from_utf8_lossy(&output.stdout).into_owned(),
            error_text: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
            succeeded: output.status.success(),
            timed_out: false,
        }
    }
}

/// 桥接调用能力
///
/// 会话、流程都只依赖这个 trait；测试里用记录调用的假实现替换
#[async_trait]
pub trait BridgeInvoker: Send + Sync {
    async fn invoke(&self, command: BridgeCommand) -> BridgeResult;
}

#[async_trait]
impl<T: BridgeInvoker + ?Sized> BridgeInvoker for Box<T> {
    async fn invoke(&self, command: BridgeCommand) -> BridgeResult {
        (**self).invoke(command).await
    }
}

/// 基于子进程的桥接调用器
///
/// 每次调用启动一个新进程，不复用；同一时刻只能有一个调用在进行
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    executable: PathBuf,
    leading_args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessInvoker {
    /// 创建新的调用器
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            leading_args: Vec::new(),
            timeout: None,
        }
    }

    /// 放在命令名之前的参数（例如用 mono 启动桥接程序时的 exe 路径）
    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    /// 单次调用时限，`None` 表示无限等待
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn run(&self, command: &BridgeCommand) -> BridgeResult {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.leading_args)
            .arg(command.name())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!("启动桥接程序失败 ({}): {}", self.executable.display(), e);
                return BridgeResult::launch_failed(e.to_string());
            }
        };

        // 超时后 future 被丢弃，kill_on_drop 负责终止子进程
        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(waited) => waited,
                Err(_) => {
                    warn!(
                        "⏱️ 桥接命令超时 ({} 秒): {}",
                        limit.as_secs(),
                        command.display_line()
                    );
                    return BridgeResult::timed_out(limit);
                }
            },
            None => child.wait_with_output().await,
        };

        match waited {
            Ok(output) => BridgeResult::from_output(&output),
            Err(e) => {
                error!("等待桥接程序退出失败: {}", e);
                BridgeResult::launch_failed(e.to_string())
            }
        }
    }
}

#[async_trait]
impl BridgeInvoker for ProcessInvoker {
    async fn invoke(&self, command: BridgeCommand) -> BridgeResult {
        debug!(
            "执行桥接命令: {} {}",
            self.executable.display(),
            command.display_line()
        );

        let result = self.run(&command).await;

        if !result.output_text.is_empty() {
            debug!("桥接输出: {}", result.output_text.trim_end());
        }
        if !result.error_text.is_empty() {
            error!("桥接错误: {}", result.error_text.trim_end());
        }

        result
    }
}
