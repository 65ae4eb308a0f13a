//! Header-less ZIP code list: written once by the `zips` command, read as
//! the location list by every scrape.

use std::fs;
use std::path::Path;

use zipcrawl_core::{Location, ZipRecord};

use crate::{strip_bom, SinkError};

/// Reads the location keys in `column` (0-based) from a header-less CSV.
///
/// Blank keys are skipped with a warning.
///
/// # Errors
///
/// - [`SinkError::Io`] / [`SinkError::Csv`] if the file cannot be read.
/// - [`SinkError::MissingColumn`] if a row is too short for `column`.
pub fn load_locations(path: &Path, column: usize) -> Result<Vec<Location>, SinkError> {
    let bytes = fs::read(path).map_err(SinkError::io(path))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(strip_bom(&bytes));

    let mut locations = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(SinkError::csv(path))?;
        let row_number = index + 1;
        let key = row.get(column).ok_or_else(|| SinkError::MissingColumn {
            path: path.to_path_buf(),
            row: row_number,
            column,
        })?;
        let key = key.trim();
        if key.is_empty() {
            tracing::warn!(path = %path.display(), row = row_number, "skipping row with blank location");
            continue;
        }
        locations.push(Location::new(key));
    }

    tracing::info!(path = %path.display(), count = locations.len(), "loaded locations");
    Ok(locations)
}

/// Writes `records` to `path` unless the file already exists.
///
/// Returns `true` if the list was written. The file is built under a
/// temporary name and renamed into place, so an interrupted run never
/// leaves a partial list behind.
///
/// # Errors
///
/// Returns [`SinkError::Io`] or [`SinkError::Csv`] on any write failure.
pub fn write_zip_list(path: &Path, records: &[ZipRecord]) -> Result<bool, SinkError> {
    if path.exists() {
        tracing::info!(
            path = %path.display(),
            "ZIP code list already exists; delete it to regenerate"
        );
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(SinkError::io(parent))?;
    }

    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp)
            .map_err(SinkError::csv(&tmp))?;
        for record in records {
            writer.serialize(record).map_err(SinkError::csv(&tmp))?;
        }
        writer.flush().map_err(SinkError::io(&tmp))?;
    }
    fs::rename(&tmp, path).map_err(SinkError::io(path))?;

    tracing::info!(path = %path.display(), count = records.len(), "ZIP code list created");
    Ok(true)
}
