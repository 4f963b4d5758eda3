//! Report composition and execution for label cross-tabulation.

mod runner;
mod summary;

pub use crate::normalize::MAX_DECIMALS;
pub use runner::{crosstab_percent, CrosstabReport, Report, ReportConfig};
pub use summary::ReportSummary;
