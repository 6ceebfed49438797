//! Error types for index construction and snapshot validation.
//!
//! Queries over a built index never fail: out-of-alphabet pattern symbols
//! count as zero occurrences, and out-of-range run indexes are asserted
//! preconditions (programmer error). Everything that can go wrong goes wrong
//! during construction, and construction never returns a partial index.

use thiserror::Error;

/// Error variants for index construction.
#[derive(Debug, Error)]
pub enum Error {
    /// The declared text length disagrees with the sum of run lengths.
    #[error("declared text length {declared} but run lengths sum to {actual}")]
    LengthMismatch { declared: u64, actual: u64 },

    /// A run field exceeds its fixed-width capacity.
    #[error("{field} value {value} exceeds fixed-width capacity {max}")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// A run-length record could not be parsed (1-based line number).
    #[error("malformed run-length record at line {line}")]
    MalformedRecord { line: usize },

    /// Run-length input ended before the declared records were read.
    #[error("run-length input truncated")]
    TruncatedInput,

    /// A snapshot failed structural validation.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(&'static str),

    /// An I/O error occurred while reading run-length input.
    #[cfg(feature = "std")]
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for index construction.
pub type Result<T> = core::result::Result<T, Error>;
