//! Tabular report rendering: `.xlsx` workbooks and CSV.

use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, XlsxError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Excel's sheet-name length limit.
const SHEET_NAME_MAX: usize = 31;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("workbook rendering failed: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("csv rendering failed: {0}")]
    Csv(String),

    #[error("a workbook needs at least one sheet")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Timestamp(DateTime<Utc>),
}

impl Cell {
    fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Integer(n) => n.to_string(),
            Cell::Decimal(n) => format!("{n:.2}"),
            Cell::Timestamp(at) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Cell::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(value: DateTime<Utc>) -> Self {
        Cell::Timestamp(value)
    }
}

/// One labeled table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Render as CSV with a header line.
    pub fn to_csv(&self) -> Result<Vec<u8>, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .map_err(|e| ExportError::Csv(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row.iter().map(Cell::display))
                .map_err(|e| ExportError::Csv(e.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|e| ExportError::Csv(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Render as an `.xlsx` file: bold header row, one worksheet per sheet.
    pub fn to_xlsx(&self) -> Result<Vec<u8>, ExportError> {
        if self.sheets.is_empty() {
            return Err(ExportError::Empty);
        }

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let header = Format::new().set_bold();
        let timestamp = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
        let decimal = Format::new().set_num_format("0.00");

        for sheet in &self.sheets {
            let name: String = sheet.name.chars().take(SHEET_NAME_MAX).collect();
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&name)?;

            for (col, title) in sheet.headers.iter().enumerate() {
                worksheet.write_string_with_format(0, col as u16, title, &header)?;
            }
            for (idx, row) in sheet.rows.iter().enumerate() {
                let r = idx as u32 + 1;
                for (col, cell) in row.iter().enumerate() {
                    let c = col as u16;
                    match cell {
                        Cell::Text(s) => {
                            worksheet.write_string(r, c, s)?;
                        }
                        Cell::Integer(n) => {
                            worksheet.write_number(r, c, *n as f64)?;
                        }
                        Cell::Decimal(n) => {
                            worksheet.write_number_with_format(r, c, *n, &decimal)?;
                        }
                        Cell::Timestamp(at) => {
                            worksheet.write_datetime_with_format(r, c, &at.naive_utc(), &timestamp)?;
                        }
                    }
                }
            }
            worksheet.autofit();
        }

        Ok(workbook.save_to_buffer()?)
    }
}
