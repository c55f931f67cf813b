use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::error::Error;

/// A single cell in a dashboard table.
///
/// Tables are loosely typed: a numeric column may temporarily hold text after
/// a CSV import, and the validation pipeline decides what to do about it.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    /// Numeric view of the cell, coercing numeric-looking text.
    ///
    /// Mirrors the import sanitizer: `"42"` and `"4.2"` coerce, `"abc"`,
    /// booleans and nulls do not.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Display form used for CSV export and duplicate-key comparison.
    pub fn to_display(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Number(n) => {
                // Keep integral values free of a trailing ".0"
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
        }
    }

    /// Parse a raw CSV field into the most specific value kind.
    pub fn from_field(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return CellValue::Number(n);
        }
        match trimmed {
            "true" => CellValue::Bool(true),
            "false" => CellValue::Bool(false),
            _ => CellValue::Text(field.to_string()),
        }
    }

    /// Convert a JSON value coming from the edit API.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => CellValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// Plain (untagged) JSON used in API responses.
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Number(n) => json!(n),
            CellValue::Text(s) => json!(s),
            CellValue::Bool(b) => json!(b),
        }
    }
}

/// An in-memory table: ordered column names plus rows of cells.
///
/// Every dataset on the dashboard (monthly sales, state ranking, lead
/// demographics, ...) is one of these, keyed by its `data_key` in the
/// session store.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from literal records; panics if a record width differs
    /// from the header width, which only happens on programmer error in the
    /// seed data.
    pub fn from_rows(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        for row in &rows {
            assert_eq!(row.len(), columns.len(), "seed row width mismatch");
        }
        Table { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Overwrite one cell, addressed by row index and column name.
    pub fn set(
        &mut self,
        row: usize,
        column: &str,
        value: CellValue,
    ) -> Result<(), Box<dyn Error>> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| format!("unknown column '{}'", column))?;
        let cells = self
            .rows
            .get_mut(row)
            .ok_or_else(|| format!("row {} out of bounds", row))?;
        cells[idx] = value;
        Ok(())
    }

    /// Iterate a column as numbers, skipping cells that do not coerce.
    pub fn numeric_column(&self, column: &str) -> Vec<f64> {
        match self.column_index(column) {
            Some(idx) => self
                .rows
                .iter()
                .filter_map(|r| r[idx].as_number())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Sum of a numeric column; non-numeric cells contribute nothing.
    pub fn column_sum(&self, column: &str) -> f64 {
        self.numeric_column(column).iter().sum()
    }

    /// Index of the row with the largest value in `column`.
    pub fn max_row(&self, column: &str) -> Option<usize> {
        let idx = self.column_index(column)?;
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r[idx].as_number().map(|n| (i, n)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Index of the row with the smallest value in `column`.
    pub fn min_row(&self, column: &str) -> Option<usize> {
        let idx = self.column_index(column)?;
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r[idx].as_number().map(|n| (i, n)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Append every row of `other`, aligning columns by name.
    ///
    /// Columns of `other` that this table does not have are dropped; columns
    /// this table has but `other` lacks are filled with `Null`.
    pub fn append(&mut self, other: &Table) {
        let mapping: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|c| other.column_index(c))
            .collect();
        for row in &other.rows {
            let aligned: Vec<CellValue> = mapping
                .iter()
                .map(|m| match m {
                    Some(idx) => row[*idx].clone(),
                    None => CellValue::Null,
                })
                .collect();
            self.rows.push(aligned);
        }
    }

    /// Add a column with a default value written into every existing row.
    pub fn add_column(&mut self, name: &str, default: CellValue) -> Result<(), Box<dyn Error>> {
        if self.has_column(name) {
            return Err(format!("column '{}' already exists", name).into());
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(default.clone());
        }
        Ok(())
    }

    /// Drop all rows, keeping the header.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// API representation: `{ columns: [...], rows: [[...], ...] }` with
    /// untagged cell values.
    pub fn to_json(&self) -> Value {
        let rows: Vec<Value> = self
            .rows
            .iter()
            .map(|r| Value::Array(r.iter().map(|c| c.to_json()).collect()))
            .collect();
        json!({
            "columns": self.columns,
            "rows": rows,
            "row_count": self.rows.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            &["brand", "sales"],
            vec![
                vec![
                    CellValue::Text("FIAT".to_string()),
                    CellValue::Number(248.0),
                ],
                vec![
                    CellValue::Text("FORD".to_string()),
                    CellValue::Number(136.0),
                ],
            ],
        )
    }

    #[test]
    fn cell_numeric_coercion() {
        assert_eq!(CellValue::Number(4.5).as_number(), Some(4.5));
        assert_eq!(CellValue::Text(" 42 ".to_string()).as_number(), Some(42.0));
        assert_eq!(CellValue::Text("abc".to_string()).as_number(), None);
        assert_eq!(CellValue::Bool(true).as_number(), None);
        assert_eq!(CellValue::Null.as_number(), None);
    }

    #[test]
    fn field_parsing_kinds() {
        assert_eq!(CellValue::from_field(""), CellValue::Null);
        assert_eq!(CellValue::from_field("12"), CellValue::Number(12.0));
        assert_eq!(CellValue::from_field("true"), CellValue::Bool(true));
        assert_eq!(
            CellValue::from_field("São Paulo"),
            CellValue::Text("São Paulo".to_string())
        );
    }

    #[test]
    fn display_strips_integral_fraction() {
        assert_eq!(CellValue::Number(248.0).to_display(), "248");
        assert_eq!(CellValue::Number(51.9).to_display(), "51.9");
        assert_eq!(CellValue::Null.to_display(), "");
    }

    #[test]
    fn set_and_get_by_name() {
        let mut t = sample();
        t.set(1, "sales", CellValue::Number(150.0)).unwrap();
        assert_eq!(t.get(1, "sales"), Some(&CellValue::Number(150.0)));
        assert!(t.set(5, "sales", CellValue::Null).is_err());
        assert!(t.set(0, "nope", CellValue::Null).is_err());
    }

    #[test]
    fn sum_and_extremes() {
        let t = sample();
        assert_eq!(t.column_sum("sales"), 384.0);
        assert_eq!(t.max_row("sales"), Some(0));
        assert_eq!(t.min_row("sales"), Some(1));
        assert_eq!(t.max_row("missing"), None);
    }

    #[test]
    fn append_aligns_by_name() {
        let mut t = sample();
        // Columns deliberately reordered, with an extra one to be dropped.
        let incoming = Table::from_rows(
            &["sales", "brand", "extra"],
            vec![vec![
                CellValue::Number(99.0),
                CellValue::Text("VW".to_string()),
                CellValue::Text("x".to_string()),
            ]],
        );
        t.append(&incoming);
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(2, "brand"), Some(&CellValue::Text("VW".to_string())));
        assert_eq!(t.get(2, "sales"), Some(&CellValue::Number(99.0)));
    }

    #[test]
    fn append_fills_missing_with_null() {
        let mut t = sample();
        let incoming = Table::from_rows(
            &["brand"],
            vec![vec![CellValue::Text("VW".to_string())]],
        );
        t.append(&incoming);
        assert_eq!(t.get(2, "sales"), Some(&CellValue::Null));
    }

    #[test]
    fn add_column_backfills() {
        let mut t = sample();
        t.add_column("category", CellValue::Text(String::new())).unwrap();
        assert_eq!(t.columns.len(), 3);
        assert_eq!(t.get(0, "category"), Some(&CellValue::Text(String::new())));
        assert!(t.add_column("category", CellValue::Null).is_err());
    }
}
