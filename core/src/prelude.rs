/// Parameter name to value mapping as published by the registry.
///
/// Backed by an insertion-ordered map so fields render in descriptor order;
/// equality between two maps ignores key order.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Errors raised while editing a settings draft.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("unknown pipeline: {0}")]
    UnknownPipeline(String),
    #[error("unknown parameter: {0}")]
    UnknownParam(String),
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),
    #[error("parameter {param} expects a {expected} edit")]
    KindMismatch { param: String, expected: &'static str },
    #[error("parameter {param} has no element {index} (length {len})")]
    IndexOutOfRange {
        param: String,
        index: usize,
        len: usize,
    },
    #[error("no pipeline selected")]
    NoPipelineSelected,
}

pub type EditResult<T> = Result<T, EditError>;

/// Errors raised by requests against the registry collaborator.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while loading console configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
