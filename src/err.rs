use crate::state::RunState;
use crate::xslt::XmlDiagnostics;

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The kind of access a file failed to provide during the accessibility check.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => f.write_str("readable"),
            Access::Write => f.write_str("writable"),
        }
    }
}

/// Errors that end a run. Every variant is attributed to exactly one [`RunState`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to open run log `{}`: {source}", path.display())]
    Configuration {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{}` is not {access}", path.display())]
    Inaccessible { path: PathBuf, access: Access },

    #[error(transparent)]
    Stylesheet(#[from] StylesheetError),

    #[error(transparent)]
    EventSource(SourceError),

    #[error("failed to open output file `{}`: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Transform(#[from] TransformError),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open event log `{}`: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },

    #[error("failed to read event record: {source}")]
    Record {
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

#[derive(Debug, Error)]
pub enum StylesheetError {
    #[error("stylesheet path `{}` is not valid UTF-8", path.display())]
    InvalidPath { path: PathBuf },

    #[error("failed to compile stylesheet `{}`: {diagnostics}", path.display())]
    Compile {
        path: PathBuf,
        diagnostics: XmlDiagnostics,
    },
}

/// Per-record failures. Any of these aborts the remaining stream.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Read(#[from] SourceError),

    #[error("failed to parse XML of record {record_id}: {diagnostics}")]
    Parse {
        record_id: u64,
        diagnostics: XmlDiagnostics,
    },

    #[error("failed to apply stylesheet to record {record_id}: {diagnostics}")]
    Apply {
        record_id: u64,
        diagnostics: XmlDiagnostics,
    },

    #[error("failed to write output line: {0}")]
    Write(#[source] io::Error),

    #[error("cannot process events in state {state}, event source, stylesheet or output is not open")]
    NotPrepared { state: RunState },
}
