use std::fmt;

/// Result type for octl-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors the fake cloud backend or descriptor lookups can raise. Stands in
/// for the out-of-scope "transport / remote" collaborator's error surface
/// (§7 error kind 4) — real transports would return richer variants, but
/// the contract downstream components depend on is just "an error string
/// reached the Page Reader".
#[derive(Debug)]
pub enum Error {
    UnknownOperation(String),
    NotFound { kind: &'static str, id: String },
    Validation(String),
    /// Reading or writing the persisted cloud-state snapshot failed.
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownOperation(name) => write!(f, "unknown operation {name:?}"),
            Error::NotFound { kind, id } => write!(f, "{kind} {id:?} not found"),
            Error::Validation(msg) => write!(f, "{msg}"),
            Error::Io(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Io(err.to_string())
    }
}
