//! Common error types for kubedeck.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while parsing core vocabulary types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// An image reference was empty.
    #[error("empty image reference")]
    EmptyImage,

    /// An image reference carried no `:tag` part.
    #[error("image reference has no tag: {0}")]
    UntaggedImage(String),

    /// An unknown resource kind name was given.
    #[error("unknown resource kind: {0}")]
    UnknownKind(String),
}
