#![forbid(unsafe_code)]

//! Error types for geometry validation and order maintenance.

use thiserror::Error;

use crate::sequence::ItemId;

/// Rejected grid geometry input.
///
/// Raised when a [`GridLayout`](crate::geometry::GridLayout) is built from
/// dimensions that would yield a negative, zero, or infinite cell index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A dimension was NaN or infinite.
    #[error("{field} must be finite, got {value}")]
    NotFinite {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A box or container dimension was zero or negative.
    #[error("{field} must be > 0, got {value}")]
    NonPositive {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The inter-box gap was negative.
    #[error("gap_px must be >= 0, got {0}")]
    NegativeGap(f64),
    /// The container holds more cells than a linear index can address.
    #[error("grid of {columns} x {rows} cells exceeds {max} cells")]
    TooManyCells {
        /// Columns the container would hold.
        columns: f64,
        /// Rows the container would hold.
        rows: f64,
        /// Largest accepted cell count.
        max: u64,
    },
}

/// Failure of an order-maintenance operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The identifier is already present in the sequence.
    #[error("item {0} is already in the sequence")]
    DuplicateItem(ItemId),
    /// The identifier is not present in the sequence.
    #[error("item {0} is not in the sequence")]
    UnknownItem(ItemId),
    /// A drag cannot start on an empty sequence.
    #[error("cannot drag in an empty sequence")]
    Empty,
    /// The sequence is owned by an in-progress gesture.
    #[error("a drag gesture is in progress")]
    GestureActive,
}
