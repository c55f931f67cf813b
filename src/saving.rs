use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;

use crate::seed::Dashboard;

/// Write a whole dashboard to a gzipped bincode snapshot file.
pub fn save_dashboard(dashboard: &Dashboard, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = std::io::BufWriter::new(encoder);

    serialize_into(&mut writer, dashboard)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    Ok(())
}

/// Load a dashboard back from a snapshot file.
pub fn load_dashboard(filename: &str) -> std::io::Result<Dashboard> {
    let file = File::open(filename)?;
    let decoder = GzDecoder::new(file);
    let mut reader = std::io::BufReader::new(decoder);

    let dashboard: Dashboard = deserialize_from(&mut reader)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    check_row_widths(&dashboard)?;
    Ok(dashboard)
}

/// Snapshots decode through bincode, which knows nothing about the table
/// shape; a row narrower than its header would make every by-index cell
/// access panic later, so malformed dashboards are rejected here.
fn check_row_widths(dashboard: &Dashboard) -> std::io::Result<()> {
    for (data_key, table) in dashboard {
        let width = table.columns.len();
        if let Some(row) = table.rows.iter().find(|r| r.len() != width) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "table '{}' has a row with {} cell(s), expected {}",
                    data_key,
                    row.len(),
                    width
                ),
            ));
        }
    }
    Ok(())
}

/// Serialize a dashboard into an in-memory buffer (HTTP download path).
pub fn serialize_to_memory(dashboard: &Dashboard, buffer: &mut Vec<u8>) -> std::io::Result<()> {
    let encoder = GzEncoder::new(buffer, Compression::default());
    let mut writer = std::io::BufWriter::new(encoder);

    serialize_into(&mut writer, dashboard)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    Ok(())
}

/// Deserialize a dashboard from an uploaded snapshot buffer.
pub fn deserialize_from_memory(buffer: &[u8]) -> std::io::Result<Dashboard> {
    use std::io::Cursor;

    let cursor = Cursor::new(buffer);
    let decoder = GzDecoder::new(cursor);
    let mut reader = std::io::BufReader::new(decoder);

    let dashboard: Dashboard = deserialize_from(&mut reader)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    check_row_widths(&dashboard)?;
    Ok(dashboard)
}
