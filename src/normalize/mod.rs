//! Normalization and simplification of contingency tables for display.
//!
//! - **rows**: Row-wise percentages
//! - **collapse**: Folding low-share columns into an "other" column

pub mod collapse;
pub mod rows;

pub use collapse::{
    select_and_collapse_columns, select_and_collapse_columns_with_label, CollapsedMatrix,
    OTHER_LABEL,
};
pub use rows::{normalize_rows, round_to, PercentMatrix, ZeroRowPolicy, MAX_DECIMALS};
