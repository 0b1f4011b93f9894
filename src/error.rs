use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Pipeline error taxonomy
// ---------------------------------------------------------------------------

/// Coarse classification used by the UI to decide how to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or unreadable input file.
    File,
    /// Malformed content or unexpected schema.
    Parse,
    /// A country/year combination that is not in the data.
    Lookup,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed Parquet in {}: {source}", path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("unreadable record batch in {}: {source}", path.display())]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("missing expected column '{column}'")]
    MissingColumn { column: String },

    #[error("year column '{column}' appears more than once")]
    DuplicateColumn { column: String },

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType { column: String, data_type: String },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("invalid year range {start}..={end}")]
    InvalidRange { start: i32, end: i32 },

    #[error("no record for country '{country}' in {year}")]
    Lookup { country: String, year: i32 },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Io { .. } => ErrorKind::File,
            PipelineError::Lookup { .. } => ErrorKind::Lookup,
            PipelineError::Csv { source, .. } if source.is_io_error() => ErrorKind::File,
            _ => ErrorKind::Parse,
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
