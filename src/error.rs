use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
///
/// 只有结构性致命的情况才会以错误形式向上传播；
/// 单次桥接调用失败、单行失败都在检测它们的组件里被转换成布尔结果或计数。
#[derive(Debug, Error)]
pub enum AppError {
    /// 资源缺失（模板、表格、桥接程序、映射文件）
    #[error("资源缺失: {0}")]
    Resource(#[from] ResourceError),
    /// 表格读写错误
    #[error("表格错误: {0}")]
    Sheet(#[from] SheetError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 批处理被整体中止
    #[error("批处理中止: {0}")]
    Batch(#[from] BatchError),
}

/// 资源缺失错误
///
/// 在任何外部调用之前检测，从不重试。
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("模板文件不存在: {}", path.display())]
    TemplateNotFound { path: PathBuf },
    #[error("表格文件不存在: {}", path.display())]
    SpreadsheetNotFound { path: PathBuf },
    #[error("映射文件不存在: {}", path.display())]
    MappingNotFound { path: PathBuf },
    /// 指定路径或标准位置都找不到桥接程序
    #[error("找不到 EZCADBridge.exe (已检查: {})", format_paths(searched))]
    BridgeNotFound { searched: Vec<PathBuf> },
}

/// 表格相关错误
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("读取表格失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("不支持的表格格式: {}", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("表格中没有任何工作表: {}", path.display())]
    NoWorksheet { path: PathBuf },
    #[error("写回处理状态失败 ({}): {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("映射文件解析失败 ({}): {source}", path.display())]
    MappingParseFailed {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("配置文件解析失败 ({}): {source}", path.display())]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// 批处理级致命错误
///
/// 出现时没有任何数据行被处理。
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchError {
    #[error("模板文件不存在: {}", path.display())]
    TemplateNotFound { path: PathBuf },
    #[error("无法打开模板文件: {}", path.display())]
    TemplateOpenFailed { path: PathBuf },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ========== 便捷构造函数 ==========

impl SheetError {
    pub fn read_failed(
        path: impl Into<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SheetError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }

    pub fn write_failed(
        path: impl Into<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SheetError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
