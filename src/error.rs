//! Error taxonomy shared by every store operation.

/// Everything that can fail across the store's API.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bad configuration at construction time (empty path, etc.).
    Config(String),
    /// Read, write, or rename failure underneath the store.
    Io(String),
    /// Failed to serialize the mapping for persistence.
    Serialize(String),
    /// The backing file does not contain a single valid JSON object.
    Corrupt(String),
    /// A mapping operation was called before any data was loaded, or after a
    /// failed reload left the store unusable.
    NotLoaded,
    /// Insert without overwrite on a key that is already present. Carries the
    /// offending key.
    KeyExists(String),
    /// Mutation attempted on a store opened read-only.
    ReadOnly,
    /// A queued write was discarded by a reload before it reached disk.
    Discarded,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Io(msg) => write!(f, "i/o error: {msg}"),
            Error::Serialize(msg) => write!(f, "serialization error: {msg}"),
            Error::Corrupt(msg) => write!(f, "corrupt backing file: {msg}"),
            Error::NotLoaded => write!(f, "store is not loaded"),
            Error::KeyExists(key) => write!(f, "key {key:?} already exists"),
            Error::ReadOnly => write!(f, "store is read-only"),
            Error::Discarded => write!(f, "queued write was discarded by a reload"),
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
        if err.is_io() {
            Error::Io(err.to_string())
        } else if err.is_syntax() || err.is_eof() || err.is_data() {
            Error::Corrupt(err.to_string())
        } else {
            Error::Serialize(err.to_string())
        }
    }
}

/// Shorthand result carrying this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
