use std::fmt;

/// Result type for octl-engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the Request Builder, Page Reader, Filter Chain and
/// Formatter — the four error kinds from §7 that aren't "flag / argument"
/// or "schema / introspection" (those live closer to the CLI boundary).
#[derive(Debug)]
pub enum Error {
    /// Bad `--template`/stdin JSON, or a JSON parse failure mid-pipeline.
    RequestBuild(String),
    /// A required flag was missing after assignment (§4.6 step 4).
    MissingRequired(Vec<String>),
    /// The underlying call returned an error (§7 kind 4, "transport / remote").
    Remote(String),
    /// A `--filter`/`--jq` expression failed to compile or evaluate (§7 kind 6).
    Filter(String),
    /// A formatter could not render a value in its selected strategy.
    Format(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RequestBuild(msg) => write!(f, "request build error: {msg}"),
            Error::MissingRequired(fields) => {
                write!(f, "missing required flags: {}", fields.join(", "))
            }
            Error::Remote(msg) => write!(f, "{msg}"),
            Error::Filter(msg) => write!(f, "filter error: {msg}"),
            Error::Format(msg) => write!(f, "format error: {msg}"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::RequestBuild(err.to_string())
    }
}

impl From<octl_client::Error> for Error {
    fn from(err: octl_client::Error) -> Self {
        Error::Remote(err.to_string())
    }
}
