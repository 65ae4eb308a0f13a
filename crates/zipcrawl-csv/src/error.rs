use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// An existing result file was written with a different field set.
    #[error("header of {} does not match the result schema (found {found:?})", .path.display())]
    HeaderMismatch { path: PathBuf, found: Vec<String> },

    #[error("{} row {row} has no column {column}", .path.display())]
    MissingColumn {
        path: PathBuf,
        row: usize,
        column: usize,
    },
}

impl SinkError {
    pub(crate) fn io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &std::path::Path) -> impl FnOnce(csv::Error) -> Self + '_ {
        move |source| SinkError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}
