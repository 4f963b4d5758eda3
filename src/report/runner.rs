//! Report configuration and execution: labels in, display-ready tables out.

use crate::data::{ContingencyMatrix, LabelOrder, LabelTable};
use crate::error::{ConcordanceError, Result};
use crate::normalize::{
    normalize_rows, select_and_collapse_columns_with_label, CollapsedMatrix, PercentMatrix,
    ZeroRowPolicy, MAX_DECIMALS, OTHER_LABEL,
};
use crate::profile::{profile_agreement, profile_purity, AgreementProfile, PurityProfile};
use crate::report::summary::ReportSummary;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

fn default_name() -> String {
    "unnamed".to_string()
}

fn default_other_label() -> String {
    OTHER_LABEL.to_string()
}

fn default_decimals() -> u32 {
    2
}

/// Report configuration for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Name of the report.
    #[serde(default = "default_name")]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Label table column used for rows (e.g. cluster ids).
    pub row_column: String,
    /// Label table column used for columns (e.g. predicted cell types).
    pub col_column: String,
    /// Ordering of the row domain.
    #[serde(default)]
    pub row_order: LabelOrder,
    /// Ordering of the column domain, applied before `canonical_columns`.
    #[serde(default)]
    pub col_order: LabelOrder,
    /// Column names to put first, in this order.
    #[serde(default)]
    pub canonical_columns: Option<Vec<String>>,
    /// Handling of rows with zero total.
    #[serde(default)]
    pub zero_rows: ZeroRowPolicy,
    /// Minimum column share (percent) to keep a column; None disables collapsing.
    #[serde(default)]
    pub collapse_threshold: Option<f64>,
    /// Label of the aggregate column.
    #[serde(default = "default_other_label")]
    pub other_label: String,
    /// Decimals used when writing percentages.
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

impl ReportConfig {
    /// Create a config for two label columns with default settings.
    pub fn new(row_column: &str, col_column: &str) -> Self {
        Self {
            name: default_name(),
            description: None,
            row_column: row_column.to_string(),
            col_column: col_column.to_string(),
            row_order: LabelOrder::default(),
            col_order: LabelOrder::default(),
            canonical_columns: None,
            zero_rows: ZeroRowPolicy::default(),
            collapse_threshold: None,
            other_label: default_other_label(),
            decimals: default_decimals(),
        }
    }

    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(ConcordanceError::from)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.row_column.trim().is_empty() || self.col_column.trim().is_empty() {
            return Err(ConcordanceError::InvalidParameter(
                "row_column and col_column must be set".to_string(),
            ));
        }
        if let Some(threshold) = self.collapse_threshold {
            if !(0.0..=100.0).contains(&threshold) {
                return Err(ConcordanceError::InvalidParameter(format!(
                    "collapse_threshold must be between 0 and 100, got {}",
                    threshold
                )));
            }
        }
        if self.other_label.is_empty() {
            return Err(ConcordanceError::InvalidParameter(
                "other_label must not be empty".to_string(),
            ));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(ConcordanceError::InvalidParameter(format!(
                "decimals must be at most {}",
                MAX_DECIMALS
            )));
        }
        Ok(())
    }
}

/// Builder for constructing and running cross-tabulation reports.
#[derive(Debug, Clone)]
pub struct Report {
    config: ReportConfig,
}

impl Report {
    /// Create a report over two label columns.
    pub fn new(row_column: &str, col_column: &str) -> Self {
        Self {
            config: ReportConfig::new(row_column, col_column),
        }
    }

    /// Create from a config.
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Set the report name.
    pub fn name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    /// Order the row domain.
    pub fn row_order(mut self, order: LabelOrder) -> Self {
        self.config.row_order = order;
        self
    }

    /// Order the column domain.
    pub fn col_order(mut self, order: LabelOrder) -> Self {
        self.config.col_order = order;
        self
    }

    /// Put these columns first, in this order.
    pub fn canonical_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.config.canonical_columns = Some(columns.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    /// Choose how zero-total rows are normalized.
    pub fn zero_rows(mut self, policy: ZeroRowPolicy) -> Self {
        self.config.zero_rows = policy;
        self
    }

    /// Collapse columns whose largest share is below `threshold` percent.
    pub fn collapse_below(mut self, threshold: f64) -> Self {
        self.config.collapse_threshold = Some(threshold);
        self
    }

    /// Rename the aggregate column.
    pub fn other_label(mut self, label: &str) -> Self {
        self.config.other_label = label.to_string();
        self
    }

    /// Decimals used when writing percentages.
    pub fn decimals(mut self, decimals: u32) -> Self {
        self.config.decimals = decimals;
        self
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> ReportConfig {
        let mut config = self.config.clone();
        if let Some(description) = description {
            config.description = Some(description.to_string());
        }
        config
    }

    /// Run the report on a label table.
    pub fn run(&self, labels: &LabelTable) -> Result<CrosstabReport> {
        let config = &self.config;
        config.validate()?;

        info!(
            name = %config.name,
            rows = %config.row_column,
            cols = %config.col_column,
            n_observations = labels.n_observations(),
            "running report"
        );

        let counts = labels.crosstab(&config.row_column, &config.col_column)?;
        self.run_counts(counts)
    }

    /// Run the report on an already built contingency matrix.
    pub fn run_counts(&self, counts: ContingencyMatrix) -> Result<CrosstabReport> {
        let config = &self.config;
        config.validate()?;

        let mut counts = counts
            .sort_rows(config.row_order)
            .sort_cols(config.col_order);
        if let Some(canonical) = &config.canonical_columns {
            counts = counts.reorder_columns(canonical)?;
        }
        debug!(
            n_rows = counts.n_rows(),
            n_cols = counts.n_cols(),
            total = counts.total(),
            "ordered contingency matrix"
        );

        let percent = normalize_rows(&counts, config.zero_rows)?;

        let collapsed = config
            .collapse_threshold
            .map(|threshold| {
                select_and_collapse_columns_with_label(&percent, threshold, &config.other_label)
            })
            .transpose()?;

        let purity = profile_purity(&counts);
        let agreement = if counts.total() > 0 {
            Some(profile_agreement(&counts)?)
        } else {
            None
        };

        info!(
            name = %config.name,
            ari = agreement.as_ref().map(|a| a.ari),
            purity = purity.overall_purity,
            "report complete"
        );

        Ok(CrosstabReport {
            config: config.clone(),
            generated: chrono::Utc::now().to_rfc3339(),
            counts,
            percent,
            collapsed,
            purity,
            agreement,
        })
    }
}

/// All artefacts produced by a report run.
#[derive(Debug, Clone)]
pub struct CrosstabReport {
    /// Configuration the report ran with.
    pub config: ReportConfig,
    /// Generation timestamp (RFC 3339).
    pub generated: String,
    /// Ordered contingency counts.
    pub counts: ContingencyMatrix,
    /// Row percentages.
    pub percent: PercentMatrix,
    /// Collapsed percentages, when a threshold was configured.
    pub collapsed: Option<CollapsedMatrix>,
    /// Dominant column per row.
    pub purity: PurityProfile,
    /// Agreement scores, None when there were no observations.
    pub agreement: Option<AgreementProfile>,
}

impl CrosstabReport {
    /// Condensed, serializable view of the report.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            name: self.config.name.clone(),
            generated: self.generated.clone(),
            row_column: self.config.row_column.clone(),
            col_column: self.config.col_column.clone(),
            n_observations: self.counts.total(),
            n_rows: self.counts.n_rows(),
            n_cols: self.counts.n_cols(),
            ari: self.agreement.as_ref().map(|a| a.ari),
            nmi: self.agreement.as_ref().map(|a| a.nmi),
            purity: self.purity.overall_purity,
            zero_rows: self
                .percent
                .zero_rows
                .iter()
                .map(|&i| self.percent.row_labels[i].clone())
                .collect(),
            kept_columns: self.collapsed.as_ref().map(|c| c.kept_labels.clone()),
            collapsed_columns: self.collapsed.as_ref().map(|c| c.collapsed_labels.clone()),
            majority_labels: self.purity.majority_labels(),
        }
    }

    /// Write every table plus `summary.json` into a directory.
    ///
    /// Files: `counts.tsv`, `percent.tsv`, `collapsed.tsv` (only when
    /// collapsing was configured) and `summary.json`.
    pub fn write_tsv_dir<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        self.counts.to_tsv(dir.join("counts.tsv"))?;
        self.percent.to_tsv(dir.join("percent.tsv"), self.config.decimals)?;
        if let Some(collapsed) = &self.collapsed {
            collapsed.to_tsv(dir.join("collapsed.tsv"), self.config.decimals)?;
        }

        let file = File::create(dir.join("summary.json"))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.summary())?;
        writer.flush()?;

        info!(dir = %dir.display(), "wrote report");
        Ok(())
    }
}

/// Cross-tabulate two label columns with default settings.
pub fn crosstab_percent(
    labels: &LabelTable,
    row_column: &str,
    col_column: &str,
) -> Result<PercentMatrix> {
    let counts = labels.crosstab(row_column, col_column)?;
    normalize_rows(&counts, ZeroRowPolicy::default())
}
