use std::fmt;

/// Result type for octl-types operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or walking the data model.
#[derive(Debug)]
pub enum Error {
    /// A dotted field path did not resolve against a [`crate::field::FieldShape`] tree.
    UnknownFieldPath(String),
    /// A value could not be coerced into the kind a [`crate::flag::Flag`] declares.
    TypeMismatch { path: String, expected: &'static str },
    /// JSON (de)serialization failure.
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownFieldPath(path) => write!(f, "unknown field path {path:?}"),
            Error::TypeMismatch { path, expected } => {
                write!(f, "field {path:?} expected a {expected} value")
            }
            Error::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
