use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Catalog error: {0}")]
    Catalog(String),
    #[error("History conflict: {0}")]
    Conflict(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, LibraryError>;

// Helper conversions
impl From<config::ConfigError> for LibraryError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<serde_json::Error> for LibraryError {
    fn from(e: serde_json::Error) -> Self { Self::Catalog(e.to_string()) }
}
impl From<std::io::Error> for LibraryError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
