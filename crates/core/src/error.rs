//! Error types for wire-bundle-core.

use thiserror::Error;

/// Errors reported when constructing an optimizer from invalid input.
///
/// Validation happens once, at construction time. The solve path itself
/// never returns an error: an unsolvable batch is reported through the
/// infeasible sentinel layout instead (see
/// [`BundleLayout`](crate::BundleLayout)).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The bundle contains no wires.
    #[error("bundle must contain at least one wire")]
    EmptyBundle,

    /// A wire radius is zero, negative, or not finite.
    #[error("wire radius must be positive and finite (wire {index}: {value})")]
    InvalidRadius {
        /// Index of the offending wire in the input order.
        index: usize,
        /// The rejected radius value.
        value: f64,
    },

    /// The manufacturing margin is negative or not finite.
    #[error("margin must be a non-negative finite fraction, got {0}")]
    InvalidMargin(f64),

    /// The inner exclusion radius is negative or not finite.
    #[error("inner exclusion radius must be non-negative and finite, got {0}")]
    InvalidInnerRadius(f64),
}

/// Result type for wire-bundle-core operations.
pub type Result<T> = std::result::Result<T, Error>;
