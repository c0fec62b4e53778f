use crate::error::{PipelineError, Result};
use crate::structs::{Column, ColumnKind, Table, Value, fold_name};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Labels for the age quartile buckets, youngest first.
pub const AGE_GROUP_LABELS: [&str; 4] = ["Young Adult", "Adult", "Middle-aged", "Senior"];

/// Purchase-frequency code to days between purchases.
pub const FREQUENCY_MAPPING: [(&str, i64); 7] = [
    ("Fortnightly", 14),
    ("Weekly", 7),
    ("Monthly", 30),
    ("Quarterly", 90),
    ("Bi-Weekly", 14),
    ("Annually", 365),
    ("Every 3 Months", 90),
];

/// Explicit renames applied after the lowercase/underscore pass.
const RENAMES: [(&str, &str); 1] = [("purchase_amount_(usd)", "purchase_amount")];

/// Aggregation statistic used when filling missing values.
#[derive(Debug, Clone, Copy)]
pub enum Statistic {
    Median,
    Mean,
}

/// What the imputer did: how many cells were filled, and which groups had no
/// known value at all and were left missing.
#[derive(Debug, Default)]
pub struct ImputeSummary {
    pub filled: usize,
    pub unfilled_groups: Vec<String>,
}

/// Outcome of the redundancy check.
#[derive(Debug, PartialEq, Eq)]
pub enum Redundancy {
    Dropped,
    Kept { mismatches: usize },
}

/// Fills missing values of `target` with a per-group statistic computed over
/// the rows sharing the same `group` value.
///
/// Groups whose `target` cells are all missing stay missing; they are logged
/// at WARN and reported in the returned summary rather than silently
/// inherited or silently fixed.
///
/// # Errors
/// Returns an error when either column is absent or `target` is not numeric.
pub fn impute_by_group(
    table: &mut Table,
    target: &str,
    group: &str,
    stat: Statistic,
) -> Result<ImputeSummary> {
    let group_keys: Vec<String> = table
        .expect_column(group)?
        .values
        .iter()
        .map(|v| v.to_string())
        .collect();

    let target_col = table.expect_column_mut(target)?;
    if !target_col.kind.is_numeric() {
        return Err(PipelineError::Data(format!(
            "cannot impute non-numeric column '{}'",
            target
        )));
    }

    let mut partitions: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (row, key) in group_keys.iter().enumerate() {
        partitions.entry(key).or_default().push(row);
    }
    debug!(
        "Imputing '{}' by {:?} over {} '{}' groups",
        target,
        stat,
        partitions.len(),
        group
    );

    let mut summary = ImputeSummary::default();
    for (key, rows) in &partitions {
        let known: Vec<f64> = rows
            .iter()
            .filter_map(|&row| target_col.values[row].as_f64())
            .collect();
        if known.is_empty() {
            warn!(
                "group '{}' has no known '{}' values, leaving {} rows missing",
                key,
                target,
                rows.len()
            );
            summary.unfilled_groups.push(key.to_string());
            continue;
        }

        let fill = match stat {
            Statistic::Median => median(&known),
            Statistic::Mean => known.iter().sum::<f64>() / known.len() as f64,
        };
        for &row in rows {
            if target_col.values[row].is_null() {
                target_col.values[row] = Value::Float(fill);
                summary.filled += 1;
            }
        }
    }

    // Filling an integer column with a median can introduce fractional cells.
    if summary.filled > 0 && target_col.kind == ColumnKind::Int {
        target_col.kind = ColumnKind::Float;
    }

    debug!(
        "Filled {} cells, {} groups left fully missing",
        summary.filled,
        summary.unfilled_groups.len()
    );
    Ok(summary)
}

/// Renames every column to lowercase with spaces replaced by underscores,
/// then applies the explicit rename table. A rename whose source name is not
/// present is a no-op. Idempotent.
pub fn normalize_names(table: &mut Table) {
    for col in table.columns_mut() {
        col.name = fold_name(&col.name);
        if let Some((_, to)) = RENAMES.iter().find(|(from, _)| *from == col.name) {
            col.name = to.to_string();
        }
    }
}

/// Buckets a numeric column into `labels.len()` equal-frequency bins and
/// appends the labels as a new text column. Labels are given in ascending
/// order of the underlying value.
///
/// Cut points sit at the i/k percentiles of the observed (non-missing)
/// distribution, computed by linear interpolation; a value equal to a cut
/// point stays in the lower bucket. Missing source cells produce missing
/// labels.
///
/// # Errors
/// Returns the binning variant when the column has fewer distinct values than
/// requested bins, and a data error when the source column is absent or not
/// numeric.
pub fn quantile_bucket(
    table: &mut Table,
    source: &str,
    new_name: &str,
    labels: &[&str],
) -> Result<()> {
    if labels.is_empty() {
        return Err(PipelineError::Binning(
            "at least one bucket label is required".to_string(),
        ));
    }
    let values = {
        let col = table.expect_column(source)?;
        if !col.kind.is_numeric() {
            return Err(PipelineError::Data(format!(
                "cannot bucket non-numeric column '{}'",
                source
            )));
        }

        let observed: Vec<f64> = col.values.iter().filter_map(Value::as_f64).collect();
        let mut distinct = observed.clone();
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();
        if distinct.len() < labels.len() {
            return Err(PipelineError::Binning(format!(
                "column '{}' has {} distinct values, cannot form {} equal-frequency bins",
                source,
                distinct.len(),
                labels.len()
            )));
        }

        let cuts: Vec<f64> = (1..labels.len())
            .map(|i| percentile(&observed, 100.0 * i as f64 / labels.len() as f64))
            .collect();
        debug!("Cut points for '{}': {:?}", source, cuts);

        col.values
            .iter()
            .map(|v| match v.as_f64() {
                Some(x) => {
                    let bucket = cuts.iter().take_while(|&&cut| x > cut).count();
                    Value::Text(labels[bucket].to_string())
                }
                None => Value::Null,
            })
            .collect()
    };

    table.push_column(Column {
        name: new_name.to_string(),
        kind: ColumnKind::Text,
        values,
    })
}

/// Maps a column of categorical codes through a fixed code-to-integer table
/// and appends the result as a new numeric column. Codes absent from the
/// table produce missing values; unknown codes are expected and never fail.
pub fn map_codes(
    table: &mut Table,
    source: &str,
    new_name: &str,
    mapping: &[(&str, i64)],
) -> Result<()> {
    let values = {
        let col = table.expect_column(source)?;
        col.values
            .iter()
            .map(|v| match v {
                Value::Text(code) => mapping
                    .iter()
                    .find(|(known, _)| known == code)
                    .map_or(Value::Null, |(_, days)| Value::Int(*days)),
                _ => Value::Null,
            })
            .collect()
    };

    table.push_column(Column {
        name: new_name.to_string(),
        kind: ColumnKind::Int,
        values,
    })
}

/// Compares two columns row by row and drops `candidate` only when every row
/// matches `keep`. A mismatch keeps both columns and is surfaced at WARN; the
/// check result gates the drop.
pub fn drop_if_redundant(table: &mut Table, keep: &str, candidate: &str) -> Result<Redundancy> {
    let mismatches = {
        let a = table.expect_column(keep)?;
        let b = table.expect_column(candidate)?;
        a.values
            .iter()
            .zip(&b.values)
            .filter(|(x, y)| x != y)
            .count()
    };

    if mismatches == 0 {
        table.drop_column(candidate)?;
        debug!("'{}' duplicates '{}', dropped it", candidate, keep);
        Ok(Redundancy::Dropped)
    } else {
        warn!(
            "columns '{}' and '{}' differ in {} rows, keeping both",
            keep, candidate, mismatches
        );
        Ok(Redundancy::Kept { mismatches })
    }
}

/// Calculates the median of a dataset.
pub(crate) fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut sorted_data = data.to_vec();
    sorted_data.sort_by(f64::total_cmp);

    let len = sorted_data.len();
    if len.is_multiple_of(2) {
        (sorted_data[len / 2 - 1] + sorted_data[len / 2]) / 2.0
    } else {
        sorted_data[len / 2]
    }
}

/// Calculates a percentile (0.0 to 100.0) using linear interpolation.
pub(crate) fn percentile(data: &[f64], pct: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut sorted_data = data.to_vec();
    sorted_data.sort_by(f64::total_cmp);

    let index = (pct / 100.0) * (sorted_data.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower]
    } else {
        let weight = index - lower as f64;
        sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, kind: ColumnKind, values: Vec<Value>) -> Column {
        Column {
            name: name.to_string(),
            kind,
            values,
        }
    }

    fn text(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| Value::Text(v.to_string())).collect()
    }

    #[test]
    fn impute_fills_groups_with_known_values() {
        let mut table = Table::new(vec![
            column("Category", ColumnKind::Text, text(&["A", "A", "A", "B"])),
            column(
                "Review Rating",
                ColumnKind::Float,
                vec![
                    Value::Null,
                    Value::Float(4.0),
                    Value::Float(2.0),
                    Value::Null,
                ],
            ),
        ])
        .unwrap();

        let summary =
            impute_by_group(&mut table, "Review Rating", "Category", Statistic::Median).unwrap();

        let rating = table.column("Review Rating").unwrap();
        assert_eq!(rating.values[0], Value::Float(3.0));
        assert_eq!(rating.values[3], Value::Null);
        assert_eq!(summary.filled, 1);
        assert_eq!(summary.unfilled_groups, vec!["B".to_string()]);
    }

    #[test]
    fn impute_rejects_text_target() {
        let mut table = Table::new(vec![
            column("Category", ColumnKind::Text, text(&["A"])),
            column("Item", ColumnKind::Text, text(&["Coat"])),
        ])
        .unwrap();
        let result = impute_by_group(&mut table, "Item", "Category", Statistic::Median);
        assert!(matches!(result, Err(PipelineError::Data(_))));
    }

    #[test]
    fn normalize_names_is_idempotent_and_renames_purchase_amount() {
        let mut table = Table::new(vec![
            column("Purchase Amount (USD)", ColumnKind::Float, vec![]),
            column("Frequency of Purchases", ColumnKind::Text, vec![]),
        ])
        .unwrap();

        normalize_names(&mut table);
        let once = table.column_names().join(",");
        assert_eq!(once, "purchase_amount,frequency_of_purchases");

        normalize_names(&mut table);
        assert_eq!(table.column_names().join(","), once);
    }

    #[test]
    fn quantile_bucket_assigns_ascending_labels() {
        let mut table = Table::new(vec![column(
            "age",
            ColumnKind::Int,
            (1..=8).map(Value::Int).collect(),
        )])
        .unwrap();

        quantile_bucket(&mut table, "age", "age_group", &AGE_GROUP_LABELS).unwrap();

        let groups: Vec<String> = table
            .column("age_group")
            .unwrap()
            .values
            .iter()
            .map(Value::to_string)
            .collect();
        assert_eq!(
            groups,
            vec![
                "Young Adult",
                "Young Adult",
                "Adult",
                "Adult",
                "Middle-aged",
                "Middle-aged",
                "Senior",
                "Senior"
            ]
        );
    }

    #[test]
    fn quantile_bucket_ties_stay_in_lower_bucket() {
        let mut table = Table::new(vec![column(
            "n",
            ColumnKind::Int,
            vec![Value::Int(1), Value::Int(2), Value::Int(2), Value::Int(3)],
        )])
        .unwrap();

        // Median of [1, 2, 2, 3] is exactly 2, so both 2s land low.
        quantile_bucket(&mut table, "n", "half", &["low", "high"]).unwrap();

        let halves: Vec<String> = table
            .column("half")
            .unwrap()
            .values
            .iter()
            .map(Value::to_string)
            .collect();
        assert_eq!(halves, vec!["low", "low", "low", "high"]);
    }

    #[test]
    fn quantile_bucket_needs_enough_distinct_values() {
        let mut table = Table::new(vec![column(
            "age",
            ColumnKind::Int,
            vec![Value::Int(1), Value::Int(1), Value::Int(2), Value::Int(2)],
        )])
        .unwrap();

        let result = quantile_bucket(&mut table, "age", "age_group", &AGE_GROUP_LABELS);
        assert!(matches!(result, Err(PipelineError::Binning(_))));
        assert!(table.column("age_group").is_none());
    }

    #[test]
    fn map_codes_looks_up_known_codes_and_nulls_unknown() {
        let mut table = Table::new(vec![column(
            "frequency_of_purchases",
            ColumnKind::Text,
            text(&["Weekly", "Bi-Weekly", "Unknown"]),
        )])
        .unwrap();

        map_codes(
            &mut table,
            "frequency_of_purchases",
            "purchase_frequency_days",
            &FREQUENCY_MAPPING,
        )
        .unwrap();

        let days = table.column("purchase_frequency_days").unwrap();
        assert_eq!(days.kind, ColumnKind::Int);
        assert_eq!(days.values[0], Value::Int(7));
        assert_eq!(days.values[1], Value::Int(14));
        assert_eq!(days.values[2], Value::Null);
    }

    #[test]
    fn redundant_column_is_dropped() {
        let flags = [true, false, true];
        let mut table = Table::new(vec![
            column(
                "discount_applied",
                ColumnKind::Bool,
                flags.iter().map(|v| Value::Bool(*v)).collect(),
            ),
            column(
                "promo_code_used",
                ColumnKind::Bool,
                flags.iter().map(|v| Value::Bool(*v)).collect(),
            ),
        ])
        .unwrap();

        let outcome =
            drop_if_redundant(&mut table, "discount_applied", "promo_code_used").unwrap();
        assert_eq!(outcome, Redundancy::Dropped);
        assert_eq!(table.column_names(), vec!["discount_applied"]);
    }

    #[test]
    fn mismatching_column_is_kept() {
        let mut table = Table::new(vec![
            column(
                "discount_applied",
                ColumnKind::Bool,
                vec![Value::Bool(true), Value::Bool(false)],
            ),
            column(
                "promo_code_used",
                ColumnKind::Bool,
                vec![Value::Bool(true), Value::Bool(true)],
            ),
        ])
        .unwrap();

        let outcome =
            drop_if_redundant(&mut table, "discount_applied", "promo_code_used").unwrap();
        assert_eq!(outcome, Redundancy::Kept { mismatches: 1 });
        assert_eq!(table.num_columns(), 2);
    }

    #[test]
    fn cleaning_stages_chain_end_to_end() {
        let mut table = Table::new(vec![
            column("Category", ColumnKind::Text, text(&["A", "A", "B", "B"])),
            column(
                "Review Rating",
                ColumnKind::Float,
                vec![
                    Value::Null,
                    Value::Float(4.0),
                    Value::Float(3.0),
                    Value::Float(5.0),
                ],
            ),
            column(
                "Age",
                ColumnKind::Int,
                vec![Value::Int(25), Value::Int(35), Value::Int(45), Value::Int(55)],
            ),
            column(
                "Frequency of Purchases",
                ColumnKind::Text,
                text(&["Monthly", "Weekly", "Never Heard Of It", "Annually"]),
            ),
            column(
                "Discount Applied",
                ColumnKind::Bool,
                vec![Value::Bool(true); 4],
            ),
            column(
                "Promo Code Used",
                ColumnKind::Bool,
                vec![Value::Bool(true); 4],
            ),
            column(
                "Purchase Amount (USD)",
                ColumnKind::Float,
                vec![
                    Value::Float(50.0),
                    Value::Float(20.0),
                    Value::Float(35.0),
                    Value::Float(80.0),
                ],
            ),
        ])
        .unwrap();

        impute_by_group(&mut table, "Review Rating", "Category", Statistic::Median).unwrap();
        normalize_names(&mut table);
        quantile_bucket(&mut table, "age", "age_group", &AGE_GROUP_LABELS).unwrap();
        map_codes(
            &mut table,
            "frequency_of_purchases",
            "purchase_frequency_days",
            &FREQUENCY_MAPPING,
        )
        .unwrap();
        let outcome =
            drop_if_redundant(&mut table, "discount_applied", "promo_code_used").unwrap();

        assert_eq!(outcome, Redundancy::Dropped);
        assert_eq!(
            table.column("review_rating").unwrap().values[0],
            Value::Float(4.0)
        );
        assert!(table.column("purchase_amount").is_some());
        assert_eq!(
            table.column("purchase_frequency_days").unwrap().values[0],
            Value::Int(30)
        );
        assert_eq!(
            table.column("age_group").unwrap().values[0],
            Value::Text("Young Adult".to_string())
        );
        assert_eq!(
            table.column("age_group").unwrap().values[3],
            Value::Text("Senior".to_string())
        );
        assert!(table.column("promo_code_used").is_none());
    }

    #[test]
    fn median_handles_even_and_odd_counts() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn percentile_interpolates_between_observations() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&data, 50.0), 2.5);
        assert_eq!(percentile(&data, 25.0), 1.75);
        assert_eq!(percentile(&data, 100.0), 4.0);
    }
}
