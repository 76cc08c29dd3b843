//! 状态写回服务 - 业务能力层
//!
//! 只负责把"已处理"标记写回表格，不关心流程。
//! CSV 和 xlsx 都先写临时文件，再替换原文件

use crate::error::{AppResult, SheetError};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::Local;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 状态写回服务
pub struct StatusWriter {
    processed_column: String,
    processed_time_column: String,
}

impl StatusWriter {
    pub fn new(
        processed_column: impl Into<String>,
        processed_time_column: impl Into<String>,
    ) -> Self {
        Self {
            processed_column: processed_column.into(),
            processed_time_column: processed_time_column.into(),
        }
    }

    /// 为给定的数据行（从 0 开始，不含表头）写入处理标记
    ///
    /// 支持 CSV 和 xlsx（只改第一个工作表）；其它工作簿格式跳过并返回 0
    pub fn write(&self, sheet_path: &Path, processed_rows: &[usize]) -> AppResult<usize> {
        let ext = sheet_path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let written = match ext.as_str() {
            "csv" => self.write_csv(sheet_path, processed_rows)?,
            "xlsx" => self.write_xlsx(sheet_path, processed_rows)?,
            _ => {
                warn!(
                    "⚠️ 暂不支持向该格式写回状态，已跳过: {}",
                    sheet_path.display()
                );
                return Ok(0);
            }
        };

        debug!("写回状态: {} 行 -> {}", written, sheet_path.display());
        Ok(written)
    }

    fn write_csv(&self, sheet_path: &Path, processed_rows: &[usize]) -> AppResult<usize> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(sheet_path)
            .map_err(|e| SheetError::read_failed(sheet_path, e))?;

        let mut headers: Vec<String> = reader
            .headers()
            .map_err(|e| SheetError::read_failed(sheet_path, e))?
            .iter()
            .map(str::to_string)
            .collect();
        let processed_idx = column_index(&mut headers, &self.processed_column);
        let time_idx = column_index(&mut headers, &self.processed_time_column);

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| SheetError::read_failed(sheet_path, e))?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            // 只补齐短行，比表头长的行原样保留
            if row.len() < headers.len() {
                row.resize(headers.len(), String::new());
            }
            records.push(row);
        }

        let stamp = timestamp();
        let mut written = 0;
        for &idx in processed_rows {
            if let Some(row) = records.get_mut(idx) {
                row[processed_idx] = "True".to_string();
                row[time_idx] = stamp.clone();
                written += 1;
            }
        }

        let tmp_path = temp_path(sheet_path);
        write_csv_file(&tmp_path, &headers, &records)
            .map_err(|e| SheetError::write_failed(sheet_path, e))?;
        fs::rename(&tmp_path, sheet_path).map_err(|e| SheetError::write_failed(sheet_path, e))?;

        Ok(written)
    }

    /// 读出所有工作表，修改第一个工作表后整体重写
    ///
    /// 单元格的值和类型保留；样式、公式不保留
    fn write_xlsx(&self, sheet_path: &Path, processed_rows: &[usize]) -> AppResult<usize> {
        let mut sheets = read_all_sheets(sheet_path)?;
        let Some(first) = sheets.first_mut() else {
            return Err(SheetError::NoWorksheet {
                path: sheet_path.to_path_buf(),
            }
            .into());
        };

        if first.cells.is_empty() {
            first.cells.push(Vec::new());
        }
        let mut headers: Vec<String> = first.cells[0].iter().map(|c| c.to_string()).collect();
        let processed_idx = column_index(&mut headers, &self.processed_column);
        let time_idx = column_index(&mut headers, &self.processed_time_column);
        first.cells[0] = headers
            .into_iter()
            .map(|h| if h.is_empty() { Data::Empty } else { Data::String(h) })
            .collect();

        let stamp = timestamp();
        let mut written = 0;
        for &idx in processed_rows {
            let Some(row) = first.cells.get_mut(idx + 1) else {
                continue;
            };
            let width = processed_idx.max(time_idx) + 1;
            if row.len() < width {
                row.resize(width, Data::Empty);
            }
            row[processed_idx] = Data::Bool(true);
            row[time_idx] = Data::String(stamp.clone());
            written += 1;
        }

        let tmp_path = temp_path(sheet_path);
        write_workbook(&tmp_path, &sheets).map_err(|e| SheetError::write_failed(sheet_path, e))?;
        fs::rename(&tmp_path, sheet_path).map_err(|e| SheetError::write_failed(sheet_path, e))?;

        Ok(written)
    }
}

/// 一个工作表的全部单元格
struct SheetCells {
    name: String,
    /// 数据区域左上角（行、列）
    origin: (u32, u32),
    cells: Vec<Vec<Data>>,
}

fn read_all_sheets(path: &Path) -> AppResult<Vec<SheetCells>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| SheetError::read_failed(path, e))?;
    let names = workbook.sheet_names().to_owned();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| SheetError::read_failed(path, e))?;
        sheets.push(SheetCells {
            origin: range.start().unwrap_or((0, 0)),
            cells: range.rows().map(<[Data]>::to_vec).collect(),
            name,
        });
    }
    Ok(sheets)
}

fn write_workbook(path: &Path, sheets: &[SheetCells]) -> Result<(), XlsxError> {
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        let (row0, col0) = sheet.origin;
        for (r, cells) in sheet.cells.iter().enumerate() {
            for (c, cell) in cells.iter().enumerate() {
                let row = row0 + r as u32;
                let col = (col0 as usize + c) as u16;
                write_cell(worksheet, row, col, cell, &date_format, &datetime_format)?;
            }
        }
    }
    workbook.save(path)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Data,
    date_format: &Format,
    datetime_format: &Format,
) -> Result<(), XlsxError> {
    match cell {
        Data::Empty => {}
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            worksheet.write_string(row, col, s)?;
        }
        Data::Float(f) => {
            worksheet.write_number(row, col, *f)?;
        }
        Data::Int(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        Data::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            let format = if serial.fract() == 0.0 {
                date_format
            } else {
                datetime_format
            };
            worksheet.write_number_with_format(row, col, serial, format)?;
        }
        Data::Error(e) => {
            worksheet.write_string(row, col, e.to_string())?;
        }
    }
    Ok(())
}

fn write_csv_file(path: &Path, headers: &[String], records: &[Vec<String>]) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    writer.write_record(headers)?;
    for row in records {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// 找到列的位置（忽略首尾空白，与读取表格时一致），没有则追加到表头末尾
fn column_index(headers: &mut Vec<String>, name: &str) -> usize {
    match headers.iter().position(|h| h.trim() == name) {
        Some(idx) => idx,
        None => {
            headers.push(name.to_string());
            headers.len() - 1
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

impl Default for StatusWriter {
    fn default() -> Self {
        Self::new("Processed", "Processed_Time")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{load_sheet, CellValue};

    #[test]
    fn marks_only_given_rows_and_keeps_other_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        fs::write(
            &path,
            "ID,Serial,Processed,Processed_Time\n1,SN1,False,\n2,SN2,False,\n3,SN3,False,\n",
        )
        .unwrap();

        let written = StatusWriter::default().write(&path, &[0, 2]).unwrap();
        assert_eq!(written, 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][2], "True");
        assert!(!rows[0][3].is_empty());
        assert_eq!(&rows[1][1], "SN2");
        assert_eq!(&rows[1][2], "False");
        assert_eq!(&rows[1][3], "");
        assert_eq!(&rows[2][2], "True");
    }

    #[test]
    fn appends_missing_status_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.csv");
        fs::write(&path, "ID,Serial\n1,SN1\n").unwrap();

        StatusWriter::default().write(&path, &[0]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["ID", "Serial", "Processed", "Processed_Time"]
        );
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[2], "True");
    }

    #[test]
    fn cells_beyond_the_header_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        fs::write(&path, "ID,Serial\n1,SN1,note-kept\n2,SN2\n").unwrap();

        StatusWriter::default().write(&path, &[1]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("note-kept"));
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)
            .unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][2], "note-kept");
        assert_eq!(&rows[1][2], "True");
    }

    #[test]
    fn padded_status_header_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("padded.csv");
        fs::write(&path, "ID, Processed\n1,False\n").unwrap();

        StatusWriter::default().write(&path, &[0]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["ID", " Processed", "Processed_Time"]
        );
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "True");
    }

    #[test]
    fn out_of_range_rows_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        fs::write(&path, "ID\n1\n").unwrap();
        assert_eq!(StatusWriter::default().write(&path, &[5]).unwrap(), 0);
    }

    #[test]
    fn legacy_workbook_formats_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.ods");
        assert_eq!(StatusWriter::default().write(&path, &[0]).unwrap(), 0);
    }

    #[test]
    fn xlsx_write_back_keeps_values_and_other_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.xlsx");

        let mut workbook = Workbook::new();
        let data = workbook.add_worksheet();
        data.set_name("Data").unwrap();
        data.write_string(0, 0, "ID").unwrap();
        data.write_string(0, 1, "Serial").unwrap();
        data.write_number(1, 0, 1.0).unwrap();
        data.write_string(1, 1, "SN1").unwrap();
        data.write_number(2, 0, 2.0).unwrap();
        data.write_string(2, 1, "SN2").unwrap();
        let notes = workbook.add_worksheet();
        notes.set_name("Notes").unwrap();
        notes.write_string(0, 0, "keep me").unwrap();
        workbook.save(&path).unwrap();

        let written = StatusWriter::default().write(&path, &[1]).unwrap();
        assert_eq!(written, 1);
        assert!(!temp_path(&path).exists());

        let sheet = load_sheet(&path).unwrap();
        assert_eq!(sheet.headers, vec!["ID", "Serial", "Processed", "Processed_Time"]);
        assert_eq!(sheet.rows[0][0].to_string(), "1");
        assert!(sheet.rows[0][2].is_blank());
        assert_eq!(sheet.rows[1][1], CellValue::Text("SN2".into()));
        assert_eq!(sheet.rows[1][2], CellValue::Bool(true));
        assert!(!sheet.rows[1][3].is_blank());

        let mut reopened = open_workbook_auto(&path).unwrap();
        assert_eq!(reopened.sheet_names().to_owned(), vec!["Data", "Notes"]);
        let notes = reopened.worksheet_range("Notes").unwrap();
        assert_eq!(notes.get_value((0, 0)), Some(&Data::String("keep me".into())));
    }
}
