use crate::error::{AppResult, ResourceError, SheetError};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// 表格列 → 模板对象名的映射
#[derive(Debug, Clone)]
pub enum ColumnMapping {
    /// 列名即对象名，排除的列除外
    Identity { excluded: Vec<String> },
    /// 只转发映射文件中列出的列
    Explicit(HashMap<String, String>),
}

impl ColumnMapping {
    pub fn identity(excluded: Vec<String>) -> Self {
        ColumnMapping::Identity { excluded }
    }

    pub fn explicit(map: HashMap<String, String>) -> Self {
        ColumnMapping::Explicit(map)
    }

    /// 列对应的对象名，不转发时为 `None`
    pub fn entity_for<'a>(&'a self, column: &'a str) -> Option<&'a str> {
        match self {
            ColumnMapping::Identity { excluded } => {
                (!excluded.iter().any(|c| c == column)).then_some(column)
            }
            ColumnMapping::Explicit(map) => map.get(column).map(String::as_str),
        }
    }
}

/// 从 JSON 文件加载列映射，格式为 `{ "列名": "对象名" }`
pub async fn load_mapping_file(path: &Path) -> AppResult<ColumnMapping> {
    if !path.exists() {
        return Err(ResourceError::MappingNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| SheetError::MappingParseFailed {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    let map: HashMap<String, String> =
        serde_json::from_str(&content).map_err(|e| SheetError::MappingParseFailed {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    tracing::info!("加载列映射 {} 项: {}", map.len(), path.display());
    Ok(ColumnMapping::explicit(map))
}
