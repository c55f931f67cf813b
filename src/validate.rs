use crate::schema::{TableSchema, schema_for};
use crate::table::{CellValue, Table};
use serde::Serialize;
use std::collections::HashMap;

/// Outcome of running a table through the validation pipeline.
///
/// `ok == false` only when required columns are missing; every other finding
/// is a warning attached to an otherwise importable table.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub message: String,
    pub warnings: Vec<String>,
    #[serde(skip)]
    pub sanitized: Table,
}

impl ValidationReport {
    fn pass(message: impl Into<String>, warnings: Vec<String>, sanitized: Table) -> Self {
        ValidationReport {
            ok: true,
            message: message.into(),
            warnings,
            sanitized,
        }
    }

    fn fail(message: impl Into<String>, table: Table) -> Self {
        ValidationReport {
            ok: false,
            message: message.into(),
            warnings: Vec::new(),
            sanitized: table,
        }
    }
}

/// Run the full pipeline against the rule set registered for `data_key`:
///
/// 1. required-column check (hard failure),
/// 2. numeric coercion with loss warnings,
/// 3. duplicate primary-key detection,
/// 4. expected-range checks,
/// 5. null checks on required columns.
///
/// The input table is never mutated; the report carries a sanitized copy.
pub fn validate_table(table: &Table, data_key: &str) -> ValidationReport {
    let schema = match schema_for(data_key) {
        Some(s) => s,
        None => {
            return ValidationReport::pass(
                "no validation configured for this dataset",
                Vec::new(),
                table.clone(),
            );
        }
    };

    let missing: Vec<&str> = schema
        .required_columns
        .iter()
        .filter(|c| !table.has_column(c))
        .copied()
        .collect();
    if !missing.is_empty() {
        return ValidationReport::fail(
            format!("missing required columns: {}", missing.join(", ")),
            table.clone(),
        );
    }

    let mut sanitized = table.clone();
    let mut warnings = Vec::new();

    // Numeric coercion: text that parses becomes a number, text that does
    // not becomes Null and is counted as lost.
    for &col in schema.numeric_columns {
        if let Some(idx) = sanitized.column_index(col) {
            let mut lost = 0usize;
            for row in &mut sanitized.rows {
                match &row[idx] {
                    CellValue::Number(_) | CellValue::Null => {}
                    other => match other.as_number() {
                        Some(n) => row[idx] = CellValue::Number(n),
                        None => {
                            row[idx] = CellValue::Null;
                            lost += 1;
                        }
                    },
                }
            }
            if lost > 0 {
                warnings.push(format!(
                    "{} non-numeric value(s) converted to null in '{}'",
                    lost, col
                ));
            }
        }
    }

    let duplicates = duplicate_key_rows(&sanitized, schema);
    if !duplicates.is_empty() {
        warnings.push(format!(
            "{} row(s) with a duplicated primary key",
            duplicates.len()
        ));
    }

    for &(col, min, max) in schema.expected_ranges {
        let out_of_range = count_out_of_range(&sanitized, col, min, max);
        if out_of_range > 0 {
            warnings.push(format!(
                "{} value(s) outside the expected range ({}-{}) in '{}'",
                out_of_range, min, max, col
            ));
        }
    }

    for &col in schema.required_columns {
        if let Some(idx) = sanitized.column_index(col) {
            let nulls = sanitized.rows.iter().filter(|r| r[idx].is_null()).count();
            if nulls > 0 {
                warnings.push(format!(
                    "{} null value(s) in required column '{}'",
                    nulls, col
                ));
            }
        }
    }

    let message = if warnings.is_empty() {
        "data validated successfully".to_string()
    } else {
        format!("structure valid with {} warning(s)", warnings.len())
    };
    ValidationReport::pass(message, warnings, sanitized)
}

/// Indices of every row whose primary key occurs more than once
/// (all occurrences, the first included).
fn duplicate_key_rows(table: &Table, schema: &TableSchema) -> Vec<usize> {
    let key_indices: Vec<usize> = match schema
        .primary_key
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Option<Vec<_>>>()
    {
        Some(v) if !v.is_empty() => v,
        _ => return Vec::new(),
    };

    let mut seen: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for (i, row) in table.rows.iter().enumerate() {
        let key: Vec<String> = key_indices.iter().map(|&k| row[k].to_display()).collect();
        seen.entry(key).or_default().push(i);
    }
    let mut dup: Vec<usize> = seen
        .into_values()
        .filter(|rows| rows.len() > 1)
        .flatten()
        .collect();
    dup.sort_unstable();
    dup
}

fn count_out_of_range(table: &Table, column: &str, min: f64, max: f64) -> usize {
    let idx = match table.column_index(column) {
        Some(i) => i,
        None => return 0,
    };
    table
        .rows
        .iter()
        .filter_map(|r| r[idx].as_number())
        .filter(|n| *n < min || *n > max)
        .count()
}

/// Columns appended by [`annotate_problems`].
pub const PROBLEM_COLUMNS: &[&str] = &[
    "_numeric_problem",
    "_required_problem",
    "_range_problem",
    "_duplicate_problem",
    "_problem_details",
];

/// Return a copy of the table with per-row problem flags appended, for the
/// "highlight problem rows" view of the editor.
///
/// Unknown `data_key`s come back untouched.
pub fn annotate_problems(table: &Table, data_key: &str) -> Table {
    let schema = match schema_for(data_key) {
        Some(s) => s,
        None => return table.clone(),
    };

    let n = table.len();
    let mut numeric = vec![false; n];
    let mut required = vec![false; n];
    let mut range = vec![false; n];
    let mut duplicate = vec![false; n];
    let mut details = vec![String::new(); n];

    for &col in schema.numeric_columns {
        if let Some(idx) = table.column_index(col) {
            for (i, row) in table.rows.iter().enumerate() {
                if !row[idx].is_null() && row[idx].as_number().is_none() {
                    numeric[i] = true;
                    details[i].push_str(&format!("{} not numeric; ", col));
                }
            }
        }
    }

    for &col in schema.required_columns {
        if let Some(idx) = table.column_index(col) {
            for (i, row) in table.rows.iter().enumerate() {
                if row[idx].is_null() {
                    required[i] = true;
                    details[i].push_str(&format!("{} is null; ", col));
                }
            }
        }
    }

    for &(col, min, max) in schema.expected_ranges {
        if let Some(idx) = table.column_index(col) {
            for (i, row) in table.rows.iter().enumerate() {
                if let Some(v) = row[idx].as_number() {
                    if v < min || v > max {
                        range[i] = true;
                        details[i].push_str(&format!("{} out of range; ", col));
                    }
                }
            }
        }
    }

    for i in duplicate_key_rows(table, schema) {
        duplicate[i] = true;
        details[i].push_str("duplicated key; ");
    }

    let mut annotated = table.clone();
    annotated.columns.extend(PROBLEM_COLUMNS.iter().map(|c| c.to_string()));
    for (i, row) in annotated.rows.iter_mut().enumerate() {
        row.push(CellValue::Bool(numeric[i]));
        row.push(CellValue::Bool(required[i]));
        row.push(CellValue::Bool(range[i]));
        row.push(CellValue::Bool(duplicate[i]));
        row.push(CellValue::Text(
            details[i].trim_end_matches("; ").to_string(),
        ));
    }
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brands(rows: Vec<Vec<CellValue>>) -> Table {
        Table::from_rows(&["brand", "sales", "category"], rows)
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn clean_table_passes() {
        let t = brands(vec![
            vec![text("FIAT"), CellValue::Number(248.0), text("Popular")],
            vec![text("FORD"), CellValue::Number(136.0), text("SUV")],
        ]);
        let report = validate_table(&t, "brands");
        assert!(report.ok);
        assert!(report.warnings.is_empty());
        assert_eq!(report.message, "data validated successfully");
        assert_eq!(report.sanitized, t);
    }

    #[test]
    fn missing_column_fails_hard() {
        let t = Table::from_rows(
            &["brand", "sales"],
            vec![vec![text("FIAT"), CellValue::Number(1.0)]],
        );
        let report = validate_table(&t, "brands");
        assert!(!report.ok);
        assert!(report.message.contains("category"));
    }

    #[test]
    fn numeric_text_is_coerced_silently() {
        let t = brands(vec![vec![text("FIAT"), text("248"), text("Popular")]]);
        let report = validate_table(&t, "brands");
        assert!(report.ok);
        assert!(report.warnings.is_empty());
        assert_eq!(
            report.sanitized.get(0, "sales"),
            Some(&CellValue::Number(248.0))
        );
    }

    #[test]
    fn garbage_numeric_becomes_null_with_warning() {
        let t = brands(vec![vec![text("FIAT"), text("lots"), text("Popular")]]);
        let report = validate_table(&t, "brands");
        assert!(report.ok);
        assert_eq!(report.sanitized.get(0, "sales"), Some(&CellValue::Null));
        // Both the coercion loss and the resulting null in a required column.
        assert!(report.warnings.iter().any(|w| w.contains("non-numeric")));
        assert!(report.warnings.iter().any(|w| w.contains("null value(s)")));
    }

    #[test]
    fn duplicate_keys_count_all_occurrences() {
        let t = brands(vec![
            vec![text("FIAT"), CellValue::Number(1.0), text("Popular")],
            vec![text("FIAT"), CellValue::Number(2.0), text("Popular")],
            vec![text("FORD"), CellValue::Number(3.0), text("SUV")],
        ]);
        let report = validate_table(&t, "brands");
        assert!(
            report
                .warnings
                .iter()
                .any(|w| w.starts_with("2 row(s) with a duplicated"))
        );
    }

    #[test]
    fn composite_key_duplicates() {
        let t = Table::from_rows(
            &["brand", "model", "visits"],
            vec![
                vec![text("AUDI"), text("A3"), CellValue::Number(32.0)],
                vec![text("AUDI"), text("Q3"), CellValue::Number(30.0)],
                vec![text("AUDI"), text("A3"), CellValue::Number(5.0)],
            ],
        );
        let report = validate_table(&t, "vehicles_visited");
        assert!(report.warnings.iter().any(|w| w.contains("duplicated")));
    }

    #[test]
    fn range_violations_warn() {
        let t = brands(vec![vec![
            text("FIAT"),
            CellValue::Number(50_000.0),
            text("Popular"),
        ]]);
        let report = validate_table(&t, "brands");
        assert!(report.ok);
        assert!(
            report
                .warnings
                .iter()
                .any(|w| w.contains("outside the expected range (0-10000) in 'sales'"))
        );
    }

    #[test]
    fn unknown_dataset_passes_through() {
        let t = brands(vec![]);
        let report = validate_table(&t, "mystery");
        assert!(report.ok);
        assert!(report.message.contains("no validation configured"));
    }

    #[test]
    fn annotation_flags_each_problem_kind() {
        let t = brands(vec![
            vec![text("FIAT"), text("lots"), text("Popular")],
            vec![text("FIAT"), CellValue::Number(50_000.0), text("Popular")],
            vec![CellValue::Null, CellValue::Number(10.0), text("SUV")],
        ]);
        let annotated = annotate_problems(&t, "brands");
        assert_eq!(annotated.columns.len(), t.columns.len() + PROBLEM_COLUMNS.len());

        assert_eq!(annotated.get(0, "_numeric_problem"), Some(&CellValue::Bool(true)));
        assert_eq!(annotated.get(0, "_duplicate_problem"), Some(&CellValue::Bool(true)));
        assert_eq!(annotated.get(1, "_range_problem"), Some(&CellValue::Bool(true)));
        assert_eq!(annotated.get(2, "_required_problem"), Some(&CellValue::Bool(true)));

        // Details accumulate and lose the trailing separator.
        if let Some(CellValue::Text(details)) = annotated.get(0, "_problem_details") {
            assert!(details.contains("sales not numeric"));
            assert!(!details.ends_with("; "));
        } else {
            panic!("details column missing");
        }
    }

    #[test]
    fn annotation_of_unknown_dataset_is_identity() {
        let t = brands(vec![vec![text("FIAT"), CellValue::Number(1.0), text("x")]]);
        assert_eq!(annotate_problems(&t, "mystery"), t);
    }
}
