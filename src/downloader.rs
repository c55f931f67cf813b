use crate::table::{CellValue, Table};
use std::error::Error;

/// Convert a table to CSV format
///
/// The header row lists the column names; values are comma-separated with
/// commas, quotes and newlines escaped the usual way. Null cells export as
/// empty fields.
pub fn to_csv(table: &Table) -> Result<String, Box<dyn Error>> {
    let mut csv_content = String::new();

    for (i, column) in table.columns.iter().enumerate() {
        if i > 0 {
            csv_content.push(',');
        }
        csv_content.push_str(&escape_field(column));
    }
    csv_content.push('\n');

    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                csv_content.push(',');
            }
            csv_content.push_str(&escape_field(&cell.to_display()));
        }
        csv_content.push('\n');
    }

    Ok(csv_content)
}

fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Convert a table to XLSX format
///
/// Exports via `rust_xlsxwriter`: a bold header row, numbers written as
/// numbers, booleans as booleans, everything else as strings.
pub fn to_xlsx(table: &Table) -> Result<Vec<u8>, Box<dyn Error>> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (c, column) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, c as u16, column, &bold)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let xlsx_row = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let col = c as u16;
            match cell {
                CellValue::Number(n) => {
                    worksheet.write_number(xlsx_row, col, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(xlsx_row, col, *b)?;
                }
                CellValue::Text(s) => {
                    worksheet.write_string(xlsx_row, col, s)?;
                }
                CellValue::Null => {}
            }
        }
    }

    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::from_csv;
    use crate::seed::default_table;

    #[test]
    fn csv_has_header_and_escaping() {
        let table = Table::from_rows(
            &["store", "sales"],
            vec![vec![
                CellValue::Text("ACME, LTDA".to_string()),
                CellValue::Number(10.0),
            ]],
        );
        let csv = to_csv(&table).unwrap();
        assert_eq!(csv, "store,sales\n\"ACME, LTDA\",10\n");
    }

    #[test]
    fn null_exports_as_empty_field() {
        let table = Table::from_rows(
            &["a", "b"],
            vec![vec![CellValue::Null, CellValue::Number(1.0)]],
        );
        assert_eq!(to_csv(&table).unwrap(), "a,b\n,1\n");
    }

    #[test]
    fn seed_tables_round_trip_through_csv() {
        for key in ["monthly", "states", "brands", "stores", "vehicles_visited"] {
            let table = default_table(key).unwrap();
            let csv = to_csv(&table).unwrap();
            let parsed = from_csv(&csv).unwrap();
            assert_eq!(parsed, table, "{}", key);
        }
    }

    #[test]
    fn xlsx_export_produces_a_workbook() {
        let table = default_table("brands").unwrap();
        let bytes = to_xlsx(&table).unwrap();
        // XLSX files are zip archives: PK magic.
        assert!(bytes.len() > 4);
        assert_eq!(&bytes[..2], b"PK");
    }
}
