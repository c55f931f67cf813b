use crate::table::{CellValue, Table};
use crate::validate::{ValidationReport, validate_table};
use std::error::Error;

/// How an upload is applied to the existing table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportMode {
    /// Throw away the current rows and use the upload as-is.
    Replace,
    /// Keep the current rows and append the upload, aligned by column name.
    Append,
}

impl ImportMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "replace" => Some(ImportMode::Replace),
            "append" => Some(ImportMode::Append),
            _ => None,
        }
    }
}

/// Parse CSV text into a table, using the first row as the header.
///
/// The parser is quote-aware: fields may be wrapped in double quotes to
/// protect commas, and `""` inside a quoted field is a literal quote. Rows
/// whose width differs from the header are rejected rather than padded.
pub fn from_csv(content: &str) -> Result<Table, Box<dyn Error>> {
    let lines: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .collect();
    if lines.is_empty() {
        return Err("CSV file is empty".into());
    }

    let header = parse_csv_row(lines[0]);
    if header.iter().any(|h| h.trim().is_empty()) {
        return Err("CSV header contains an empty column name".into());
    }
    let width = header.len();

    let mut table = Table::new(header.iter().map(|h| h.trim().to_string()).collect());
    for (line_no, line) in lines.iter().enumerate().skip(1) {
        let fields = parse_csv_row(line);
        if fields.len() != width {
            return Err(format!(
                "row {} has {} field(s), expected {}",
                line_no + 1,
                fields.len(),
                width
            )
            .into());
        }
        table
            .rows
            .push(fields.iter().map(|f| CellValue::from_field(f)).collect());
    }

    Ok(table)
}

// Parse a CSV row into a vector of fields, honoring quoting.
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if let Some(&next) = chars.peek() {
                    if next == '"' && in_quotes {
                        // Escaped quote inside a quoted field
                        current_field.push('"');
                        chars.next();
                    } else {
                        in_quotes = !in_quotes;
                    }
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                result.push(current_field);
                current_field = String::new();
            }
            _ => {
                current_field.push(c);
            }
        }
    }

    result.push(current_field);
    result
}

/// Result of importing a CSV upload into a table.
#[derive(Debug)]
pub struct ImportOutcome {
    pub report: ValidationReport,
    /// The table after the import, `None` when validation failed hard or
    /// the run was a dry run.
    pub applied: Option<Table>,
    pub incoming_rows: usize,
    pub previous_rows: usize,
}

/// Parse, validate and (unless `dry_run`) apply a CSV upload.
pub fn import_csv(
    current: &Table,
    data_key: &str,
    content: &str,
    mode: ImportMode,
    dry_run: bool,
) -> Result<ImportOutcome, Box<dyn Error>> {
    let incoming = from_csv(content)?;
    let report = validate_table(&incoming, data_key);

    let applied = if report.ok && !dry_run {
        Some(match mode {
            ImportMode::Replace => report.sanitized.clone(),
            ImportMode::Append => {
                let mut merged = current.clone();
                merged.append(&report.sanitized);
                merged
            }
        })
    } else {
        None
    };

    Ok(ImportOutcome {
        incoming_rows: report.sanitized.len(),
        previous_rows: current.len(),
        report,
        applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::default_table;

    #[test]
    fn parses_header_and_typed_fields() {
        let table = from_csv("brand,sales,category\nFIAT,248,Popular\nFORD,136,SUV\n").unwrap();
        assert_eq!(table.columns, vec!["brand", "sales", "category"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "sales"), Some(&CellValue::Number(248.0)));
        assert_eq!(
            table.get(1, "category"),
            Some(&CellValue::Text("SUV".to_string()))
        );
    }

    #[test]
    fn quoted_fields_keep_commas_and_quotes() {
        let table = from_csv("store,sales\n\"ACME, LTDA\",10\n\"say \"\"hi\"\"\",2\n").unwrap();
        assert_eq!(
            table.get(0, "store"),
            Some(&CellValue::Text("ACME, LTDA".to_string()))
        );
        assert_eq!(
            table.get(1, "store"),
            Some(&CellValue::Text("say \"hi\"".to_string()))
        );
    }

    #[test]
    fn empty_fields_become_null() {
        let table = from_csv("brand,sales\nFIAT,\n").unwrap();
        assert_eq!(table.get(0, "sales"), Some(&CellValue::Null));
    }

    #[test]
    fn rejects_empty_and_ragged_input() {
        assert!(from_csv("").is_err());
        assert!(from_csv("  \n \n").is_err());
        let err = from_csv("a,b\n1,2,3\n").unwrap_err().to_string();
        assert!(err.contains("row 2"));
    }

    #[test]
    fn replace_swaps_the_table() {
        let current = default_table("brands").unwrap();
        let outcome = import_csv(
            &current,
            "brands",
            "brand,sales,category\nJEEP,50,SUV\n",
            ImportMode::Replace,
            false,
        )
        .unwrap();
        assert!(outcome.report.ok);
        assert_eq!(outcome.previous_rows, 5);
        assert_eq!(outcome.incoming_rows, 1);
        assert_eq!(outcome.applied.unwrap().len(), 1);
    }

    #[test]
    fn append_extends_the_table() {
        let current = default_table("brands").unwrap();
        let outcome = import_csv(
            &current,
            "brands",
            "brand,sales,category\nJEEP,50,SUV\n",
            ImportMode::Append,
            false,
        )
        .unwrap();
        let merged = outcome.applied.unwrap();
        assert_eq!(merged.len(), 6);
        assert_eq!(
            merged.get(5, "brand"),
            Some(&CellValue::Text("JEEP".to_string()))
        );
    }

    #[test]
    fn dry_run_never_applies() {
        let current = default_table("brands").unwrap();
        let outcome = import_csv(
            &current,
            "brands",
            "brand,sales,category\nJEEP,50,SUV\n",
            ImportMode::Replace,
            true,
        )
        .unwrap();
        assert!(outcome.report.ok);
        assert!(outcome.applied.is_none());
    }

    #[test]
    fn hard_validation_failure_blocks_apply() {
        let current = default_table("brands").unwrap();
        let outcome = import_csv(
            &current,
            "brands",
            "brand,sales\nJEEP,50\n",
            ImportMode::Replace,
            false,
        )
        .unwrap();
        assert!(!outcome.report.ok);
        assert!(outcome.applied.is_none());
    }
}
