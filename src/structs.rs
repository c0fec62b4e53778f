use crate::error::{PipelineError, Result};
use log::{Log, Metadata, Record as LogRecord};
use std::fmt;

/// Simple logger implementation
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &LogRecord) {
        println!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

/// A single cell of the table. `Null` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell. `None` for text, bool, and missing cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Serialized form for the output file. Missing cells become empty fields.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Null => write!(f, "NULL"),
        }
    }
}

/// Column type recorded at load time, so every stage after the loader works
/// against a declared schema instead of re-guessing cell by cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Int | ColumnKind::Float)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Int => "Int",
            ColumnKind::Float => "Float",
            ColumnKind::Bool => "Bool",
            ColumnKind::Text => "Text",
        };
        write!(f, "{}", name)
    }
}

/// A named, typed column of cells.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Value>,
}

/// A required input column, matched against loaded headers with
/// case and space/underscore differences folded away.
#[derive(Debug, Clone, Copy)]
pub struct RequiredColumn {
    pub name: &'static str,
    pub kinds: &'static [ColumnKind],
}

/// Canonical form of a column name: lowercase, spaces replaced by underscores.
pub(crate) fn fold_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// In-memory table: ordered named columns of equal length, rows aligned by
/// position. Created once by the loader and mutated in place by each stage.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.values.len();
            for col in &columns {
                if col.values.len() != rows {
                    return Err(PipelineError::Data(format!(
                        "column '{}' has {} rows, expected {}",
                        col.name,
                        col.values.len(),
                        rows
                    )));
                }
            }
        }
        Ok(Table { columns })
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn expect_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| PipelineError::Data(format!("column not found: {}", name)))
    }

    pub fn expect_column_mut(&mut self, name: &str) -> Result<&mut Column> {
        self.column_mut(name)
            .ok_or_else(|| PipelineError::Data(format!("column not found: {}", name)))
    }

    /// Appends a derived column. The new column must match the row count and
    /// must not shadow an existing name.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.column(&column.name).is_some() {
            return Err(PipelineError::Data(format!(
                "column already exists: {}",
                column.name
            )));
        }
        if !self.columns.is_empty() && column.values.len() != self.num_rows() {
            return Err(PipelineError::Data(format!(
                "column '{}' has {} rows, expected {}",
                column.name,
                column.values.len(),
                self.num_rows()
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str) -> Result<Column> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| PipelineError::Data(format!("column not found: {}", name)))?;
        Ok(self.columns.remove(idx))
    }

    /// Validates that every required column is present with an accepted kind.
    /// Names are matched in canonical form so the check works both before and
    /// after schema normalization.
    pub fn require_columns(&self, required: &[RequiredColumn]) -> Result<()> {
        for req in required {
            let col = self
                .columns
                .iter()
                .find(|c| fold_name(&c.name) == req.name)
                .ok_or_else(|| {
                    PipelineError::Data(format!("required column '{}' is missing", req.name))
                })?;
            if !req.kinds.contains(&col.kind) {
                return Err(PipelineError::Data(format!(
                    "column '{}' loaded as {}, expected one of {:?}",
                    col.name, col.kind, req.kinds
                )));
            }
        }
        Ok(())
    }
}
