//! Cluster Concordance Library
//!
//! This library cross-tabulates two categorical labelings of the same
//! observations, typically unsupervised cluster ids and reference-mapped
//! cell types from a single-cell experiment, and prepares the resulting
//! contingency table for heatmap display.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (ContingencyMatrix, LabelTable, LabelOrder)
//! - **normalize**: Row percentages and low-share column collapsing
//! - **profile**: Agreement scores (purity, ARI, NMI)
//! - **report**: Report composition, YAML configuration and output
//!
//! # Example
//!
//! ```no_run
//! use cluster_concordance::prelude::*;
//!
//! let labels = LabelTable::from_tsv("cells.tsv").unwrap();
//!
//! let report = Report::new("seurat_clusters", "predicted_celltype")
//!     .row_order(LabelOrder::Natural)
//!     .collapse_below(10.0)
//!     .run(&labels)
//!     .unwrap();
//!
//! report.write_tsv_dir("crosstab").unwrap();
//! ```

pub mod data;
pub mod error;
pub mod normalize;
pub mod profile;
pub mod report;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{natural_cmp, ContingencyMatrix, LabelOrder, LabelTable};
    pub use crate::error::{ConcordanceError, LabelSide, Result};
    pub use crate::normalize::{
        normalize_rows, round_to, select_and_collapse_columns,
        select_and_collapse_columns_with_label, CollapsedMatrix, PercentMatrix, ZeroRowPolicy,
        OTHER_LABEL,
    };
    pub use crate::profile::{
        adjusted_rand_index, normalized_mutual_info, profile_agreement, profile_purity,
        AgreementProfile, PurityProfile, RowAssignment,
    };
    pub use crate::report::{
        crosstab_percent, CrosstabReport, Report, ReportConfig, ReportSummary,
    };
}
