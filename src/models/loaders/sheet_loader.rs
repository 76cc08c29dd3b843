use crate::error::{AppResult, SheetError};
use crate::models::data_row::{CellValue, DataRow};
use crate::models::loaders::mapping_loader::ColumnMapping;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveTime;
use std::path::Path;

/// 表格的第一个工作表
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// 按列映射转换为数据行
    ///
    /// 行标识取 `id_column` 列的值；映射之外的列不会转发
    pub fn to_data_rows(&self, mapping: &ColumnMapping, id_column: &str) -> Vec<DataRow> {
        let id_idx = self.headers.iter().position(|h| h == id_column);

        self.rows
            .iter()
            .map(|cells| {
                let id = id_idx
                    .and_then(|i| cells.get(i))
                    .filter(|v| !v.is_blank())
                    .map(ToString::to_string);

                let fields = self
                    .headers
                    .iter()
                    .zip(cells.iter())
                    .filter_map(|(column, value)| {
                        mapping
                            .entity_for(column)
                            .map(|entity| (entity.to_string(), value.clone()))
                    })
                    .collect();

                DataRow::new(id, fields)
            })
            .collect()
    }
}

/// 读取表格文件的第一个工作表
///
/// CSV 的值保持为文本；工作簿格式保留单元格类型
pub fn load_sheet(path: &Path) -> AppResult<Sheet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let sheet = match ext.as_str() {
        "csv" => load_csv(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path)?,
        _ => {
            return Err(SheetError::UnsupportedFormat {
                path: path.to_path_buf(),
            }
            .into())
        }
    };

    tracing::info!(
        "成功加载表格 {}: {} 列, {} 行",
        path.file_name().unwrap_or_default().to_string_lossy(),
        sheet.headers.len(),
        sheet.rows.len()
    );
    Ok(sheet)
}

fn load_csv(path: &Path) -> AppResult<Sheet> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| SheetError::read_failed(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SheetError::read_failed(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SheetError::read_failed(path, e))?;
        let mut cells: Vec<CellValue> = record.iter().map(CellValue::from_text).collect();
        cells.resize(headers.len(), CellValue::Blank);
        rows.push(cells);
    }

    Ok(Sheet { headers, rows })
}

fn load_workbook(path: &Path) -> AppResult<Sheet> {
    let mut workbook = open_workbook_auto(path).map_err(|e| SheetError::read_failed(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::NoWorksheet {
            path: path.to_path_buf(),
        })?
        .map_err(|e| SheetError::read_failed(path, e))?;

    let mut iter = range.rows();
    let headers: Vec<String> = match iter.next() {
        Some(first) => first.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => return Ok(Sheet::default()),
    };

    let rows = iter
        .map(|cells| {
            let mut row: Vec<CellValue> = cells.iter().map(cell_from_data).collect();
            row.resize(headers.len(), CellValue::Blank);
            row
        })
        .collect();

    Ok(Sheet { headers, rows })
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Blank,
        Data::String(s) => CellValue::from_text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) if d.time() == NaiveTime::MIN => {
                CellValue::Text(d.format("%Y-%m-%d").to_string())
            }
            Some(d) => CellValue::Text(d.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Number(dt.as_f64()),
        },
        other => CellValue::from_text(other.to_string()),
    }
}
