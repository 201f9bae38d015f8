#![forbid(unsafe_code)]

//! Error types.
//!
//! Property writes report rejection through their `bool` result; the
//! `try_*` variants lift that into [`PropertyError`] for callers that prefer
//! `?`. Nothing in this crate returns an error for a dead binding or a stale
//! connection: those operations are defined as no-ops.

use thiserror::Error;

/// Errors surfaced by the fallible property APIs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PropertyError {
    /// The owner-supplied validator or setter refused the value. The
    /// property kept its previous value and emitted nothing.
    #[error("write to property `{property}` was rejected")]
    Rejected {
        /// Name of the property (see `named`), or `"unnamed"`.
        property: &'static str,
    },
}

/// Crate-wide result alias.
pub type Result<T, E = PropertyError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display_names_property() {
        let err = PropertyError::Rejected { property: "age" };
        assert_eq!(err.to_string(), "write to property `age` was rejected");
    }

    #[test]
    fn is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&PropertyError::Rejected { property: "x" });
    }
}
