use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use datafusion::error::DataFusionError;
use thiserror::Error;

/// Unified error type for callframe crates.
///
/// Parse-time variants (`UnrecognizedOperation`, `MalformedSpan`,
/// `ReservedWordLiteral`) are raised before any data is touched. The
/// remaining variants come from dispatch, once the table schema is known.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unrecognized operation '{name}': {reason}")]
    UnrecognizedOperation { name: String, reason: String },

    #[error("Malformed span '{span}': {reason}")]
    MalformedSpan { span: String, reason: String },

    #[error("Literal value collides with reserved keyword '{keyword}'")]
    ReservedWordLiteral { keyword: String },

    #[error("Unknown column '{column}' (available: {})", .available.join(", "))]
    UnknownColumn { column: String, available: Vec<String> },

    #[error("Type mismatch: '{operator}' cannot be applied to column '{column}' of type {data_type}")]
    TypeMismatch { column: String, data_type: DataType, operator: String },

    #[error("'{operation}' requires an external table named '{target}'")]
    MissingJoinTarget { operation: String, target: String },

    #[error("Join key '{column}' not found in {side} table")]
    JoinKeyNotFound { column: String, side: &'static str },

    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("DataFusion error: {0}")]
    DataFusion(#[from] DataFusionError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(msg: &str) -> Self {
        Error::Execution(msg.to_string())
    }

    pub fn malformed(span: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedSpan { span: span.into(), reason: reason.into() }
    }

    pub fn unrecognized(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::UnrecognizedOperation { name: name.into(), reason: reason.into() }
    }

    /// True for errors raised while parsing a call name.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Error::UnrecognizedOperation { .. }
                | Error::MalformedSpan { .. }
                | Error::ReservedWordLiteral { .. }
        )
    }
}
