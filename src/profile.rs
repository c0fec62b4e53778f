use crate::error::Result;
use crate::structs::{Table, Value};
use crate::transform::{median, percentile};
use std::collections::BTreeMap;

/// Renders the first `n` rows of the table as an aligned grid.
pub fn head(table: &Table, n: usize) -> String {
    let names = table.column_names();
    let rows = collect_rows(table, &names, n).unwrap_or_default();
    render_grid(&names, &rows)
}

/// Renders the first `n` rows of the named columns only, in the given order.
///
/// # Errors
/// Returns an error when one of the names is not a column of the table.
pub fn sample(table: &Table, names: &[&str], n: usize) -> Result<String> {
    let rows = collect_rows(table, names, n)?;
    Ok(render_grid(names, &rows))
}

/// Renders the table schema: row/column counts plus one line per column with
/// its declared kind and non-null count.
pub fn info(table: &Table) -> String {
    let width = name_width(table);
    let mut lines = vec![format!(
        "{} rows x {} columns",
        table.num_rows(),
        table.num_columns()
    )];
    for col in table.columns() {
        let non_null = col.values.iter().filter(|v| !v.is_null()).count();
        lines.push(format!(
            "{:<width$}  {:<5}  {} non-null",
            col.name, col.kind, non_null
        ));
    }
    lines.join("\n")
}

/// Renders per-column summary statistics. Numeric columns get
/// count/mean/std/min/quartiles/max, text and bool columns get
/// count/unique/top/freq. Missing cells are excluded from every statistic.
pub fn describe(table: &Table) -> String {
    let width = name_width(table);
    let mut lines = Vec::with_capacity(table.num_columns());
    for col in table.columns() {
        let line = if col.kind.is_numeric() {
            let observed: Vec<f64> = col.values.iter().filter_map(Value::as_f64).collect();
            if observed.is_empty() {
                format!("{:<width$}  count=0", col.name)
            } else {
                let count = observed.len();
                let mean = observed.iter().sum::<f64>() / count as f64;
                let std_dev = if count > 1 {
                    let variance = observed
                        .iter()
                        .map(|x| (x - mean).powi(2))
                        .sum::<f64>()
                        / (count - 1) as f64;
                    variance.sqrt()
                } else {
                    0.0
                };
                let min = observed.iter().fold(f64::INFINITY, |a, &b| a.min(b));
                let max = observed.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
                format!(
                    "{:<width$}  count={} mean={:.2} std={:.2} min={:.2} 25%={:.2} 50%={:.2} 75%={:.2} max={:.2}",
                    col.name,
                    count,
                    mean,
                    std_dev,
                    min,
                    percentile(&observed, 25.0),
                    median(&observed),
                    percentile(&observed, 75.0),
                    max
                )
            }
        } else {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for value in col.values.iter().filter(|v| !v.is_null()) {
                *counts.entry(value.to_string()).or_insert(0) += 1;
            }
            if counts.is_empty() {
                format!("{:<width$}  count=0", col.name)
            } else {
                let count: usize = counts.values().sum();
                // Ties resolve to the alphabetically first value.
                let (top, freq) = counts
                    .iter()
                    .fold(("", 0), |best, (value, &n)| {
                        if n > best.1 { (value.as_str(), n) } else { best }
                    });
                format!(
                    "{:<width$}  count={} unique={} top={} freq={}",
                    col.name,
                    count,
                    counts.len(),
                    top,
                    freq
                )
            }
        };
        lines.push(line);
    }
    lines.join("\n")
}

/// Per-column count of missing values, in column order.
pub fn missing_counts(table: &Table) -> Vec<(String, usize)> {
    table
        .columns()
        .iter()
        .map(|col| {
            let missing = col.values.iter().filter(|v| v.is_null()).count();
            (col.name.clone(), missing)
        })
        .collect()
}

/// Renders the output of [`missing_counts`] as an aligned two-column report.
pub fn render_missing(counts: &[(String, usize)]) -> String {
    let width = counts.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    counts
        .iter()
        .map(|(name, missing)| format!("{:<width$}  {}", name, missing))
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_rows(table: &Table, names: &[&str], n: usize) -> Result<Vec<Vec<String>>> {
    let columns: Vec<_> = names
        .iter()
        .map(|name| table.expect_column(name))
        .collect::<Result<_>>()?;
    let shown = n.min(table.num_rows());
    Ok((0..shown)
        .map(|row| columns.iter().map(|col| col.values[row].to_string()).collect())
        .collect())
}

fn render_grid(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let header_line: Vec<String> = header
        .iter()
        .zip(widths.iter().copied())
        .map(|(h, w)| format!("{:<w$}", h))
        .collect();
    lines.push(header_line.join("  "));
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, w)| format!("{:<w$}", cell))
            .collect();
        lines.push(cells.join("  "));
    }
    lines.join("\n")
}

fn name_width(table: &Table) -> usize {
    table
        .columns()
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0)
}
