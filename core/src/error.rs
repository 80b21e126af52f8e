//! Error types for transitive-path evaluation.

use thiserror::Error;

use crate::context::CancellationReason;

/// Errors raised while planning or evaluating a transitive path.
#[derive(Error, Debug)]
pub enum Error {
    /// `min == 0` with both sides free would require the self-loop of every
    /// node in the dataset.
    #[error("evaluating the empty path is not supported for fully unbound sides")]
    EmptyPathNotSupported,

    /// The query was cancelled (client abort or timeout) while the hull was
    /// being computed.
    #[error("query cancelled ({reason}): {detail}")]
    Cancelled {
        reason: CancellationReason,
        detail: String,
    },

    /// The query-wide memory budget is exhausted.
    #[error("tried to allocate {requested} bytes, but only {available} bytes are left in the query's memory budget")]
    MemoryLimit { requested: usize, available: usize },

    /// `bind_left_side` / `bind_right_side` on a side that is not a free variable.
    #[error("cannot bind the {side} side of a transitive path: it is not a free variable")]
    SideNotFree { side: &'static str },

    /// A column index outside the width of the table it refers to.
    #[error("column {column} is out of range for a table of width {width}")]
    ColumnOutOfRange { column: usize, width: usize },

    /// A child result whose width disagrees with the width it announced.
    #[error("subtree produced {actual} columns, but announced {expected}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("unknown runtime parameter: {0}")]
    UnknownParameter(String),

    #[error("invalid value '{value}' for runtime parameter '{name}'")]
    InvalidParameterValue { name: String, value: String },

    #[error("invalid runtime parameter document: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// True for the cancellation signal, which callers surface as a
    /// timeout/cancelled outcome rather than a query failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }
}

/// Result type for transitive-path operations.
pub type Result<T> = std::result::Result<T, Error>;
