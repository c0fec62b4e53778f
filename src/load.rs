use crate::error::{PipelineError, Result};
use crate::structs::{Column, ColumnKind, Table, Value};
use csv::{ReaderBuilder, Writer};
use log::debug;
use std::fs::File;
use std::path::Path;

/// Reads a delimited file with a header row into a typed in-memory table.
///
/// Every column gets an explicit `ColumnKind` inferred from its non-empty
/// cells: all-integer columns load as `Int`, otherwise all-float as `Float`,
/// otherwise all boolean-like (`true/false/yes/no`, any case) as `Bool`, and
/// everything else as `Text`. Empty cells load as `Null` and do not veto a
/// kind.
///
/// # Errors
/// Returns the I/O variant when the file is missing or unreadable and the
/// parse variant when a row's field count disagrees with the header.
pub fn read_csv(path: &Path) -> Result<Table> {
    debug!("Reading CSV file: {}", path.display());
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(PipelineError::Parse(format!(
                "row {} has {} fields, expected {}",
                row_idx + 2,
                record.len(),
                headers.len()
            )));
        }
        for (col_idx, field) in record.iter().enumerate() {
            raw[col_idx].push(field.trim().to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| {
            let kind = infer_kind(&cells);
            let values = cells.iter().map(|cell| parse_value(cell, kind)).collect();
            Column { name, kind, values }
        })
        .collect();

    let table = Table::new(columns)?;
    debug!(
        "Loaded {} rows x {} columns",
        table.num_rows(),
        table.num_columns()
    );
    Ok(table)
}

/// Writes the table to a CSV file, header plus all rows, full overwrite.
/// Missing cells serialize as empty fields.
///
/// # Errors
/// Returns error if the file cannot be created or written to.
pub fn write_csv(table: &Table, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(table.column_names())?;
    for row in 0..table.num_rows() {
        writer.write_record(table.columns().iter().map(|c| c.values[row].render()))?;
    }

    writer.flush()?;
    Ok(())
}

fn infer_kind(cells: &[String]) -> ColumnKind {
    let mut saw_value = false;
    let mut int_ok = true;
    let mut float_ok = true;
    let mut bool_ok = true;

    for cell in cells.iter().filter(|c| !c.is_empty()) {
        saw_value = true;
        if int_ok && cell.parse::<i64>().is_err() {
            int_ok = false;
        }
        if float_ok && cell.parse::<f64>().is_err() {
            float_ok = false;
        }
        if bool_ok && parse_bool(cell).is_none() {
            bool_ok = false;
        }
        if !int_ok && !float_ok && !bool_ok {
            break;
        }
    }

    // A fully empty column carries no evidence either way.
    if !saw_value {
        return ColumnKind::Text;
    }
    if int_ok {
        ColumnKind::Int
    } else if float_ok {
        ColumnKind::Float
    } else if bool_ok {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    }
}

fn parse_value(cell: &str, kind: ColumnKind) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    match kind {
        ColumnKind::Int => cell.parse().map(Value::Int).unwrap_or(Value::Null),
        ColumnKind::Float => cell.parse().map(Value::Float).unwrap_or(Value::Null),
        ColumnKind::Bool => parse_bool(cell).map(Value::Bool).unwrap_or(Value::Null),
        ColumnKind::Text => Value::Text(cell.to_string()),
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.to_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn infers_kind_per_column() {
        let file = write_temp(
            "Age,Review Rating,Category,Discount Applied\n\
             25,4.5,Clothing,Yes\n\
             40,,Footwear,No\n",
        );
        let table = read_csv(file.path()).unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column("Age").unwrap().kind, ColumnKind::Int);
        assert_eq!(table.column("Review Rating").unwrap().kind, ColumnKind::Float);
        assert_eq!(table.column("Category").unwrap().kind, ColumnKind::Text);
        assert_eq!(
            table.column("Discount Applied").unwrap().kind,
            ColumnKind::Bool
        );

        assert_eq!(table.column("Age").unwrap().values[1], Value::Int(40));
        assert_eq!(table.column("Review Rating").unwrap().values[1], Value::Null);
        assert_eq!(
            table.column("Discount Applied").unwrap().values[0],
            Value::Bool(true)
        );
    }

    #[test]
    fn ragged_row_is_a_parse_error() {
        let file = write_temp("a,b\n1,2\n3\n");
        let result = read_csv(file.path());
        assert!(matches!(result, Err(PipelineError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = read_csv(Path::new("no_such_file.csv"));
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }

    #[test]
    fn round_trip_preserves_rows_and_values() {
        let file = write_temp(
            "age,category,rating\n\
             25,Clothing,4.5\n\
             40,Footwear,\n\
             31,Outerwear,3\n",
        );
        let table = read_csv(file.path()).unwrap();

        let out = NamedTempFile::new().unwrap();
        write_csv(&table, out.path()).unwrap();
        let reread = read_csv(out.path()).unwrap();

        assert_eq!(reread.column_names(), table.column_names());
        assert_eq!(reread.num_rows(), table.num_rows());
        for (before, after) in table.columns().iter().zip(reread.columns()) {
            let rendered_before: Vec<String> =
                before.values.iter().map(Value::render).collect();
            let rendered_after: Vec<String> =
                after.values.iter().map(Value::render).collect();
            assert_eq!(rendered_before, rendered_after);
        }
    }
}
