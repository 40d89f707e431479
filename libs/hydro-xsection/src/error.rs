//! # Cross-Section Errors
//!
//! Error types for cross-section operations.
//!
//! ## Error Policy
//!
//! - Validation failures abort the mutation before anything is written
//! - Structural misuse (proxy mutation, XYZ row add/delete, ...) aborts the
//!   call with no state change
//! - Degenerate geometry is NOT an error: derived values fall back to `0.0`
//!   (width-like) or `NaN` (elevations)

use crate::geometry::BranchId;
use thiserror::Error;

/// Errors that can occur while editing or reading cross sections.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CrossSectionError {
    /// A cell value was rejected by table validation.
    ///
    /// `row` is `None` for rows that are not yet part of the table.
    #[error("Invalid value for column {column} (row {row:?}): {message}")]
    InvalidCell {
        /// Row index, if the row is already committed
        row: Option<usize>,
        /// Column index
        column: usize,
        /// Validation message
        message: String,
    },

    /// Operation not allowed in the current state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Row or section index outside the collection.
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Collection length
        len: usize,
    },

    /// Standard shape with invalid dimensions.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// The network could not supply geometry for a branch.
    #[error("No geometry available for branch {0:?}")]
    MissingBranchGeometry(BranchId),
}

impl CrossSectionError {
    /// Creates an invalid cell error.
    pub fn invalid_cell(row: Option<usize>, column: usize, message: impl Into<String>) -> Self {
        Self::InvalidCell {
            row,
            column,
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// Creates an index out of range error.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}

/// Result type alias for cross-section operations.
pub type CrossSectionResult<T> = Result<T, CrossSectionError>;

// =============================================================================
// TESTS
// =============================================================================
