use crate::utils::error::{CardError, Result};
use std::io::Read;
use std::path::Path;

/// Reads the identifier column of a delimited inventory export. Values stay
/// strings so barcodes keep their leading zeros; empty cells are skipped.
pub fn read_identifiers<R: Read>(reader: R, delimiter: u8, column: &str) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let index = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == column)
        .ok_or_else(|| CardError::MissingColumn {
            column: column.to_string(),
            available: headers.iter().collect::<Vec<_>>().join(", "),
        })?;

    let mut identifiers = Vec::new();
    for row in rdr.records() {
        let row = row?;
        match row.get(index) {
            Some(value) if !value.is_empty() => identifiers.push(value.to_string()),
            _ => continue,
        }
    }

    tracing::debug!("Read {} identifiers from column '{}'", identifiers.len(), column);
    Ok(identifiers)
}

pub fn read_identifiers_from_path<P: AsRef<Path>>(
    path: P,
    delimiter: u8,
    column: &str,
) -> Result<Vec<String>> {
    let file = std::fs::File::open(&path)?;
    tracing::info!("📋 Reading inventory from {}", path.as_ref().display());
    read_identifiers(file, delimiter, column)
}
