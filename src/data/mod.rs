//! Data structures for label cross-tabulation.

mod contingency;
mod labels;
mod order;

pub use contingency::ContingencyMatrix;
pub use labels::LabelTable;
pub use order::{natural_cmp, LabelOrder};
