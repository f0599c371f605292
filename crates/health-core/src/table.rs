//! Column-named datasets exchanged with the relational store.
//!
//! A [`Table`] is what the store loads and returns: a name, an ordered list of
//! column names and rows of dynamically typed [`Cell`]s. Transforms never work
//! on tables directly; raw tables are decoded into typed records through
//! [`FromRow`] and cleaned records are encoded back through [`TableRecord`].

use std::fmt;

use chrono::{NaiveDate, NaiveTime};

use crate::error::{HealthError, Result};

/// Storage layout for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage layout for times of day (microsecond precision).
pub const TIME_FORMAT: &str = "%H:%M:%S%.6f";

// ── Cell ──────────────────────────────────────────────────────────────────────

/// A single dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    /// Type a raw CSV field: empty → `Null`, then integer, real, text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Cell::Integer(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return Cell::Real(f);
            }
        }
        Cell::Text(trimmed.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Text rendering of any non-null cell.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Numeric view of the cell.  Text is parsed leniently, accepting a
    /// decimal comma as written by localized exports.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Null => None,
            Cell::Integer(i) => Some(*i as f64),
            Cell::Real(f) => Some(*f),
            Cell::Text(s) => {
                let s = s.trim();
                s.parse::<f64>()
                    .ok()
                    .or_else(|| s.replace(',', ".").parse::<f64>().ok())
            }
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Real(r) => write!(f, "{}", r),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Real(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Integer(v)
    }
}

impl From<u32> for Cell {
    fn from(v: u32) -> Self {
        Cell::Integer(i64::from(v))
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<NaiveDate> for Cell {
    fn from(v: NaiveDate) -> Self {
        Cell::Text(v.format(DATE_FORMAT).to_string())
    }
}

impl From<NaiveTime> for Cell {
    fn from(v: NaiveTime) -> Self {
        Cell::Text(v.format(TIME_FORMAT).to_string())
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Null)
    }
}

// ── Record traits ─────────────────────────────────────────────────────────────

/// A typed row that can be written to the store.
pub trait TableRecord {
    /// Column names, in the order [`TableRecord::cells`] produces values.
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<Cell>;
}

/// A typed row decoded from a raw store table.
pub trait FromRow: Sized {
    /// Columns that must be present in the table, even when it has no rows.
    const REQUIRED_COLUMNS: &'static [&'static str];

    fn from_row(row: &Row<'_>) -> Result<Self>;
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// An ordered collection of rows sharing one schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Encode typed records into a table named `name`.
    pub fn from_records<T: TableRecord>(name: impl Into<String>, records: &[T]) -> Self {
        Self::from_records_with(name, &[], records)
    }

    /// Like [`Table::from_records`], for records whose `cells` append values
    /// for `extra` columns after the fixed ones.
    pub fn from_records_with<T: TableRecord>(
        name: impl Into<String>,
        extra: &[String],
        records: &[T],
    ) -> Self {
        Self {
            name: name.into(),
            columns: T::COLUMNS
                .iter()
                .map(|c| c.to_string())
                .chain(extra.iter().cloned())
                .collect(),
            rows: records.iter().map(TableRecord::cells).collect(),
        }
    }

    /// Append a row; its width must match the column count.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(HealthError::invalid_value(
                self.name.clone(),
                "<row>",
                format!("{} cells for {} columns", row.len(), self.columns.len()),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Rewrite every column name through `f`.
    pub fn rename_columns(&mut self, f: impl Fn(&str) -> String) {
        for column in self.columns.iter_mut() {
            *column = f(column);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row { table: self, cells })
    }

    /// Decode every row into `T`, failing on the first bad row.
    pub fn decode<T: FromRow>(&self) -> Result<Vec<T>> {
        if let Some(missing) = T::REQUIRED_COLUMNS
            .iter()
            .find(|c| !self.has_column(c))
        {
            return Err(HealthError::missing_column(self.name.clone(), *missing));
        }
        self.iter().map(|row| T::from_row(&row)).collect()
    }
}

// ── Row ───────────────────────────────────────────────────────────────────────

/// Borrowed view of one row with by-name column access.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    /// Column names of the table this row belongs to.
    pub fn columns(&self) -> &'a [String] {
        &self.table.columns
    }

    /// The cell in `column`, or `None` when the table has no such column.
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        self.table.column_index(column).map(|i| &self.cells[i])
    }

    fn require(&self, column: &str) -> Result<&'a Cell> {
        self.get(column)
            .ok_or_else(|| HealthError::missing_column(self.table.name.clone(), column))
    }

    /// Text in a required column; the value itself may be null.
    pub fn text(&self, column: &str) -> Result<Option<String>> {
        Ok(self.require(column)?.as_text())
    }

    /// Non-null text in a required column.
    pub fn required_text(&self, column: &str) -> Result<String> {
        self.text(column)?
            .ok_or_else(|| HealthError::invalid_value(self.table.name.clone(), column, "NULL"))
    }

    /// Number in a required column; the value itself may be null.
    pub fn number(&self, column: &str) -> Result<Option<f64>> {
        let cell = self.require(column)?;
        self.to_number(column, cell)
    }

    /// Non-null number in a required column.
    pub fn required_number(&self, column: &str) -> Result<f64> {
        self.number(column)?
            .ok_or_else(|| HealthError::invalid_value(self.table.name.clone(), column, "NULL"))
    }

    /// Number in a column the table may not have at all.
    pub fn optional_number(&self, column: &str) -> Result<Option<f64>> {
        match self.get(column) {
            Some(cell) => self.to_number(column, cell),
            None => Ok(None),
        }
    }

    fn to_number(&self, column: &str, cell: &Cell) -> Result<Option<f64>> {
        if cell.is_null() {
            return Ok(None);
        }
        cell.as_f64().map(Some).ok_or_else(|| {
            HealthError::invalid_value(self.table.name.clone(), column, cell.to_string())
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        let mut t = Table::new(
            "Bodyweight",
            vec!["sourceName".to_string(), "value".to_string()],
        );
        t.push_row(vec![Cell::from("Health"), Cell::Real(71.4)]).unwrap();
        t.push_row(vec![Cell::Null, Cell::Text("70,9".to_string())])
            .unwrap();
        t
    }

    // ── Cell::infer ───────────────────────────────────────────────────────────

    #[test]
    fn test_infer_types() {
        assert_eq!(Cell::infer(""), Cell::Null);
        assert_eq!(Cell::infer("   "), Cell::Null);
        assert_eq!(Cell::infer("42"), Cell::Integer(42));
        assert_eq!(Cell::infer("71.5"), Cell::Real(71.5));
        assert_eq!(Cell::infer(" kg "), Cell::Text("kg".to_string()));
        assert_eq!(
            Cell::infer("2019-08-01 07:00:00 +0200"),
            Cell::Text("2019-08-01 07:00:00 +0200".to_string())
        );
    }

    #[test]
    fn test_infer_does_not_treat_nan_as_number() {
        assert_eq!(Cell::infer("NaN"), Cell::Text("NaN".to_string()));
    }

    #[test]
    fn test_as_f64_accepts_decimal_comma() {
        assert_eq!(Cell::Text("1,5".to_string()).as_f64(), Some(1.5));
        assert_eq!(Cell::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Cell::Text("abc".to_string()).as_f64(), None);
        assert_eq!(Cell::Null.as_f64(), None);
    }

    #[test]
    fn test_date_and_time_cells_use_storage_layout() {
        let date = NaiveDate::from_ymd_opt(2019, 8, 1).unwrap();
        let time = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
        assert_eq!(Cell::from(date), Cell::Text("2019-08-01".to_string()));
        assert_eq!(Cell::from(time), Cell::Text("07:00:00.000000".to_string()));
        assert_eq!(Cell::from(None::<f64>), Cell::Null);
    }

    // ── Table ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut t = sample_table();
        let err = t.push_row(vec![Cell::Null]).unwrap_err();
        assert!(matches!(err, HealthError::InvalidValue { .. }));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_rename_columns() {
        let mut t = Table::new("Steps", vec!["date (local)".to_string(), "steps".to_string()]);
        t.rename_columns(|c| c.split(' ').next().unwrap_or(c).to_string());
        assert_eq!(t.columns(), &["date".to_string(), "steps".to_string()]);
    }

    // ── Row access ────────────────────────────────────────────────────────────

    #[test]
    fn test_row_text_and_number() {
        let t = sample_table();
        let rows: Vec<Row<'_>> = t.iter().collect();
        assert_eq!(rows[0].required_text("sourceName").unwrap(), "Health");
        assert_eq!(rows[0].required_number("value").unwrap(), 71.4);
        assert_eq!(rows[1].text("sourceName").unwrap(), None);
        assert_eq!(rows[1].number("value").unwrap(), Some(70.9));
    }

    #[test]
    fn test_row_missing_column_is_error() {
        let t = sample_table();
        let row = t.iter().next().unwrap();
        let err = row.number("unit").unwrap_err();
        assert!(matches!(err, HealthError::MissingColumn { .. }));
        assert_eq!(row.optional_number("unit").unwrap(), None);
    }

    #[test]
    fn test_row_required_null_is_invalid() {
        let t = sample_table();
        let row = t.iter().nth(1).unwrap();
        assert!(matches!(
            row.required_text("sourceName").unwrap_err(),
            HealthError::InvalidValue { .. }
        ));
    }

    // ── decode / from_records ─────────────────────────────────────────────────

    #[derive(Debug, PartialEq)]
    struct Weight {
        value: f64,
    }

    impl FromRow for Weight {
        const REQUIRED_COLUMNS: &'static [&'static str] = &["value"];

        fn from_row(row: &Row<'_>) -> Result<Self> {
            Ok(Self {
                value: row.required_number("value")?,
            })
        }
    }

    impl TableRecord for Weight {
        const COLUMNS: &'static [&'static str] = &["bodyweight"];

        fn cells(&self) -> Vec<Cell> {
            vec![self.value.into()]
        }
    }

    #[test]
    fn test_decode_typed_rows() {
        let weights: Vec<Weight> = sample_table().decode().unwrap();
        assert_eq!(weights, vec![Weight { value: 71.4 }, Weight { value: 70.9 }]);
    }

    #[test]
    fn test_decode_checks_columns_on_empty_table() {
        let t = Table::new("Bodyweight", vec!["sourceName".to_string()]);
        let err = t.decode::<Weight>().unwrap_err();
        assert!(matches!(err, HealthError::MissingColumn { .. }));
    }

    #[test]
    fn test_from_records() {
        let t = Table::from_records("Bodyweight", &[Weight { value: 70.0 }]);
        assert_eq!(t.name(), "Bodyweight");
        assert_eq!(t.columns(), &["bodyweight".to_string()]);
        assert_eq!(t.rows(), &[vec![Cell::Real(70.0)]]);
    }
}
