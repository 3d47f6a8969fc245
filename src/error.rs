use thiserror::Error;

/// Errors the district record store can surface.
///
/// Unknown district names are deliberately NOT an error anywhere in this
/// crate: updates targeting a name with no match are log-only no-ops.
#[derive(Debug, Error)]
pub enum MapError {
    /// The input document is not a well-formed collection of districts.
    /// Fatal to that load attempt; no partial dataset is ever published.
    #[error("malformed input document: {0}")]
    MalformedInput(String),

    /// An operation needed a current snapshot before any load succeeded.
    #[error("no dataset has been loaded")]
    NotLoaded,
}

pub type Result<T> = std::result::Result<T, MapError>;
