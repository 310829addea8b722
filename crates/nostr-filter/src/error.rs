//! Filter engine error types
//!
//! Every variant is raised synchronously during filter construction (or, for
//! `EmptyCandidate`, on a malformed match query). A failed construction
//! rejects the whole subscription request; none of these are transient.

use thiserror::Error;

/// Filter engine error type
#[derive(Debug, Error)]
pub enum FilterError {
    /// A filter item decoded to fewer bytes than the matcher allows
    #[error("filter item too small: {size} bytes (minimum {min})")]
    ItemTooSmall { size: usize, min: usize },

    /// A filter item decoded to more bytes than the matcher allows
    #[error("filter item too large: {size} bytes (maximum {max})")]
    ItemTooLarge { size: usize, max: usize },

    /// The retained items of one set exceed the packed buffer's range
    #[error("total filter items too large: {total} bytes (maximum 65535)")]
    SetTooLarge { total: usize },

    /// An id, author, or reference-tag value was not valid hex
    #[error("invalid hex in filter item: {0:?}")]
    InvalidHex(String),

    /// A match query was made with an empty candidate
    #[error("invalid match candidate: empty")]
    EmptyCandidate,

    /// More tag filters than the per-event matching cost bound allows
    #[error("too many tag filters: {count} (maximum 2)")]
    TooManyTagFilters { count: usize },

    /// A tag filter key that is not `#` plus a single letter
    #[error("unindexed tag filter: {0:?}")]
    UnindexedTag(String),

    /// A filter field this relay does not recognize
    #[error("unrecognized filter field: {0:?}")]
    UnrecognizedField(String),

    /// A subscription request that is not a well-formed REQ array
    #[error("malformed subscription request: {0}")]
    MalformedRequest(&'static str),

    /// A filter field with the wrong JSON shape
    #[error("invalid value for {field:?}: expected {expected}")]
    InvalidFieldType { field: String, expected: &'static str },
}

/// Filter engine result type
pub type Result<T> = std::result::Result<T, FilterError>;
