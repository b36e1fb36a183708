use thiserror::Error;

/// Errors surfaced by filters, their configuration accessors and the pipeline driving them.
#[derive(Error, Debug)]
pub enum FilterError {
    /// A configuration accessor was called before `init` stored a config (or after `destroy`).
    #[error("filter config not initialized: {accessor} called before init")]
    ConfigNotInitialized { accessor: &'static str },

    /// The request or response handed to an HTTP filter is not an HTTP message.
    #[error("non-HTTP request or response")]
    NonHttpMessage,

    #[error("filter {filter} failed to initialize: {reason}")]
    Init { filter: String, reason: String },

    #[error("filter {filter} has been destroyed")]
    Destroyed { filter: String },

    #[error("pipeline has been destroyed")]
    PipelineDestroyed,

    #[error("unknown filter kind: {kind}")]
    UnknownFilter { kind: String },

    #[error("invalid filter definition: {0}")]
    Definition(#[from] serde_json::Error),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("processing failed: {0}")]
    Processing(String),
}

impl From<http::header::InvalidHeaderName> for FilterError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        FilterError::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for FilterError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        FilterError::InvalidHeader(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type FilterResult<T> = Result<T, FilterError>;
