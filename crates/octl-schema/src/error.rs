use std::fmt;

/// Result type for octl-schema operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or querying the Schema View.
#[derive(Debug)]
pub enum Error {
    /// The document failed to parse as JSON at all.
    Json(serde_json::Error),
    /// The document parsed as JSON but `oas3` rejected its structure.
    InvalidSpec(oas3::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Json(err) => write!(f, "OpenAPI document is not valid JSON: {err}"),
            Error::InvalidSpec(err) => write!(f, "OpenAPI document failed validation: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(err) => Some(err),
            Error::InvalidSpec(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<oas3::Error> for Error {
    fn from(err: oas3::Error) -> Self {
        Error::InvalidSpec(err)
    }
}
