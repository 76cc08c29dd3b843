use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// EZCADBridge.exe 路径，未设置时搜索标准位置
    pub bridge_exe_path: Option<PathBuf>,
    /// 放在桥接命令之前的参数
    pub bridge_args: Vec<String>,
    /// 单次桥接调用时限（秒），0 表示不限
    pub command_timeout_secs: u64,
    /// 处理后是否写回表格状态
    pub update_status: bool,
    /// 行标识列
    pub id_column: String,
    /// 已处理标记列
    pub processed_column: String,
    /// 处理时间列
    pub processed_time_column: String,
    /// 日志目录
    pub log_dir: PathBuf,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bridge_exe_path: None,
            bridge_args: Vec::new(),
            command_timeout_secs: 120,
            update_status: true,
            id_column: "ID".to_string(),
            processed_column: "Processed".to_string(),
            processed_time_column: "Processed_Time".to_string(),
            log_dir: PathBuf::from("logs"),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从 TOML 文件加载，缺少的键使用默认值
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| {
            ConfigError::ParseFailed {
                path: path.to_path_buf(),
                source: e,
            }
            .into()
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 加载配置：文件存在时读取文件，再应用环境变量
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new("ezmark.toml");
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(base.with_env_overrides())
    }

    /// 用 `EZMARK_*` 环境变量覆盖
    pub fn with_env_overrides(self) -> Self {
        let base = self;
        Self {
            bridge_exe_path: std::env::var("EZMARK_BRIDGE_EXE").ok().map(PathBuf::from).or(base.bridge_exe_path),
            bridge_args: base.bridge_args,
            command_timeout_secs: std::env::var("EZMARK_COMMAND_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.command_timeout_secs),
            update_status: std::env::var("EZMARK_UPDATE_STATUS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.update_status),
            id_column: std::env::var("EZMARK_ID_COLUMN").unwrap_or(base.id_column),
            processed_column: base.processed_column,
            processed_time_column: base.processed_time_column,
            log_dir: std::env::var("EZMARK_LOG_DIR").ok().map(PathBuf::from).unwrap_or(base.log_dir),
            verbose_logging: std::env::var("EZMARK_VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(base.verbose_logging),
        }
    }

    /// 调用时限，0 表示不限
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }
}
