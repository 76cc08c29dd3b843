use serde::Serialize;
use std::fmt;

/// 保留的行标识字段名，不会作为对象更新
pub const ID_FIELD: &str = "id";

/// 单元格的值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Blank,
}

impl CellValue {
    /// 从文本构建，空串视为空白
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            CellValue::Blank
        } else {
            CellValue::Text(text)
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }
}

/// 发送给引擎的文本形式
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
            CellValue::Blank => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::from_text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::from_text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// 一行待标刻的数据
///
/// `fields` 按列顺序保存"对象名 → 值"；交给编排器后不再修改
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DataRow {
    pub id: Option<String>,
    pub fields: Vec<(String, CellValue)>,
}

impl DataRow {
    pub fn new(id: Option<String>, fields: Vec<(String, CellValue)>) -> Self {
        Self { id, fields }
    }

    /// 从键值对构建，键 `id` 作为行标识而不是字段
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
    {
        let mut row = DataRow::default();
        for (key, value) in pairs {
            let key = key.into();
            let value = value.into();
            if key == ID_FIELD {
                row.id = Some(value.to_string());
            } else {
                row.fields.push((key, value));
            }
        }
        row
    }

    /// 日志中显示的标识，没有时为 `Row N`（从 1 开始）
    pub fn display_id(&self, index: usize) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("Row {}", index + 1),
        }
    }
}
