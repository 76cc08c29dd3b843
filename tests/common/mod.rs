#![allow(dead_code)]

use async_trait::async_trait;
use ezcad_batch::{BridgeCommand, BridgeInvoker, BridgeResult};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&BridgeCommand) -> BridgeResult + Send + Sync;

/// 记录每次调用并按脚本返回输出的假桥接程序
#[derive(Clone)]
pub struct MockInvoker {
    calls: Arc<Mutex<Vec<BridgeCommand>>>,
    responder: Arc<Responder>,
}

impl MockInvoker {
    /// 所有命令都返回成功短语，list 返回给定的对象
    pub fn happy(entities: &[&str]) -> Self {
        let listing = list_output(entities);
        Self::with(move |cmd| match cmd {
            BridgeCommand::List => listing.clone(),
            other => success_output(other),
        })
    }

    /// 只给出标准输出，进程总是正常退出
    pub fn with(responder: impl Fn(&BridgeCommand) -> String + Send + Sync + 'static) -> Self {
        Self::with_results(move |cmd| exited_ok(responder(cmd)))
    }

    /// 完整控制每次调用的结果（退出码、错误输出）
    pub fn with_results(
        responder: impl Fn(&BridgeCommand) -> BridgeResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
        }
    }

    pub fn calls(&self) -> Vec<BridgeCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls().iter().map(|c| c.name()).collect()
    }

    pub fn updated_entities(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BridgeCommand::Update { entity, .. } => Some(entity),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl BridgeInvoker for MockInvoker {
    async fn invoke(&self, command: BridgeCommand) -> BridgeResult {
        self.calls.lock().unwrap().push(command.clone());
        (self.responder)(&command)
    }
}

pub fn exited_ok(output_text: String) -> BridgeResult {
    BridgeResult {
        output_text,
        error_text: String::new(),
        exit_code: 0,
        succeeded: true,
        timed_out: false,
    }
}

/// 桥接程序崩溃：退出码 1，只有错误输出
pub fn crashed(error_text: &str) -> BridgeResult {
    BridgeResult {
        output_text: String::new(),
        error_text: error_text.to_string(),
        exit_code: 1,
        succeeded: false,
        timed_out: false,
    }
}

pub fn success_output(cmd: &BridgeCommand) -> String {
    match cmd {
        BridgeCommand::Info => "EZCAD Bridge (mock)".to_string(),
        BridgeCommand::Open { path } => format!("EZD file opened successfully: {}", path.display()),
        BridgeCommand::Update { entity, .. } => format!("Entity {entity} updated successfully"),
        BridgeCommand::Mark { .. } => "Marking completed".to_string(),
        BridgeCommand::List => String::new(),
        BridgeCommand::Red { .. } => "Red light positioned successfully".to_string(),
        BridgeCommand::Save { path } => format!("File saved successfully: {}", path.display()),
    }
}

pub fn list_output(entities: &[&str]) -> String {
    entities
        .iter()
        .enumerate()
        .map(|(i, e)| format!("[{i}] {e} (Type: Text)\n"))
        .collect()
}

/// 在临时目录里放一个空的模板文件
pub fn template_in(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"EZCADUNI").unwrap();
    path
}
