//! Engine error taxonomy. Every error is fatal for the run; the driver
//! prints one line and maps the kind to an exit code.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Project configuration failed validation; reports the offending file
    /// and the path within the schema (e.g. `structures[0].members[1]`).
    #[error("SchemaError: {file}: {path}: {message}")]
    Schema {
        file: PathBuf,
        path: String,
        message: String,
    },

    /// The composer asked for a fragment the store does not carry.
    #[error("TemplateMissing: {key}")]
    TemplateMissing { key: String },

    /// Unresolved placeholder, unknown filter or malformed `${...}` in a
    /// fragment body.
    #[error("ExpandError: {fragment}: {detail}")]
    Expand {
        fragment: String,
        detail: ExpandDetail,
    },

    /// The planner has no rule for a subject. Indicates an inconsistency
    /// between the schema and the engine, never a user mistake.
    #[error("PlanError: {subject}: {message}")]
    Plan { subject: String, message: String },

    #[error("IOError: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("InternalError: {0}")]
    Internal(String),
}

/// What went wrong inside a single fragment expansion. The expander does
/// not know which fragment it is working on; the composer attaches that.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpandDetail {
    #[error("unresolved placeholder `{0}`")]
    MissingPlaceholder(String),

    #[error("unknown filter `{0}`")]
    UnknownFilter(String),

    #[error("malformed placeholder near `{0}`")]
    Malformed(String),
}

impl Error {
    /// Exit code contract: 0 success, 1 schema, 2 template, 3 I/O,
    /// 4 internal assertion.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Schema { .. } => 1,
            Error::TemplateMissing { .. } | Error::Expand { .. } => 2,
            Error::Io { .. } => 3,
            Error::Plan { .. } | Error::Internal(_) => 4,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
