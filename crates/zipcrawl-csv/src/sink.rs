//! Append-only CSV sink for scraped result records.
//!
//! The file is UTF-8 with a byte-order mark. The mark and the header row
//! are written once, by whichever append finds the file empty; every later
//! append adds rows only. A single aggregator owns the sink, so appends are
//! never interleaved.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use zipcrawl_core::{ResultRecord, RESULT_FIELDS};

use crate::{strip_bom, SinkError, UTF8_BOM};

#[derive(Debug)]
pub struct ResultSink {
    path: PathBuf,
}

impl ResultSink {
    /// Opens the sink at `path`. Nothing is created until the first
    /// non-empty append.
    ///
    /// # Errors
    ///
    /// - [`SinkError::HeaderMismatch`] if the file already has a header for
    ///   a different field set.
    /// - [`SinkError::Io`] / [`SinkError::Csv`] if the existing file cannot
    ///   be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        if let Some(found) = existing_header(&path)? {
            if found != RESULT_FIELDS {
                return Err(SinkError::HeaderMismatch { path, found });
            }
        }
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `records` in order and returns how many rows were written.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Io`] or [`SinkError::Csv`] on any write failure.
    pub fn append(&self, records: &[ResultRecord]) -> Result<usize, SinkError> {
        if records.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(SinkError::io(parent))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(SinkError::io(&self.path))?;
        let len = file.metadata().map_err(SinkError::io(&self.path))?.len();
        let (needs_bom, needs_header) = self.missing_prefix(len)?;
        if needs_bom {
            file.write_all(UTF8_BOM).map_err(SinkError::io(&self.path))?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer
                .write_record(RESULT_FIELDS)
                .map_err(SinkError::csv(&self.path))?;
        }
        for record in records {
            writer.serialize(record).map_err(SinkError::csv(&self.path))?;
        }
        writer.flush().map_err(SinkError::io(&self.path))?;

        tracing::debug!(path = %self.path.display(), rows = records.len(), "appended result rows");
        Ok(records.len())
    }

    /// Whether the BOM and the header still have to be written.
    ///
    /// Emptiness is judged after stripping the BOM, the same way [`open`]
    /// judges it, so a file holding only a BOM still gets its header.
    ///
    /// [`open`]: ResultSink::open
    fn missing_prefix(&self, len: u64) -> Result<(bool, bool), SinkError> {
        // Anything longer than a BOM already carries a header.
        if len > UTF8_BOM.len() as u64 {
            return Ok((false, false));
        }
        let existing = fs::read(&self.path).map_err(SinkError::io(&self.path))?;
        let needs_header = strip_bom(&existing).is_empty();
        Ok((needs_header && !existing.starts_with(UTF8_BOM), needs_header))
    }
}

/// Reads every record back from a result file written by [`ResultSink`].
///
/// # Errors
///
/// Returns [`SinkError::Io`] or [`SinkError::Csv`] if the file cannot be
/// read or a row does not match the record schema.
pub fn read_records(path: &Path) -> Result<Vec<ResultRecord>, SinkError> {
    let bytes = fs::read(path).map_err(SinkError::io(path))?;
    let mut reader = csv::Reader::from_reader(strip_bom(&bytes));
    reader
        .deserialize()
        .collect::<Result<Vec<ResultRecord>, _>>()
        .map_err(SinkError::csv(path))
}

/// Header of an existing, non-empty file; `None` if absent or empty.
fn existing_header(path: &Path) -> Result<Option<Vec<String>>, SinkError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SinkError::io(path)(e)),
    };
    let body = strip_bom(&bytes);
    if body.is_empty() {
        return Ok(None);
    }
    let mut reader = csv::Reader::from_reader(body);
    let headers = reader.headers().map_err(SinkError::csv(path))?;
    Ok(Some(headers.iter().map(str::to_owned).collect()))
}
