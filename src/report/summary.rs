//! Serializable summary of a report run.

use serde::{Deserialize, Serialize};

/// Condensed report output, written as `summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub name: String,
    pub generated: String,
    pub row_column: String,
    pub col_column: String,
    pub n_observations: u64,
    pub n_rows: usize,
    pub n_cols: usize,
    /// Adjusted Rand Index, None for an empty table.
    pub ari: Option<f64>,
    /// Normalized Mutual Information, None for an empty table.
    pub nmi: Option<f64>,
    pub purity: f64,
    /// Rows that had no observations.
    pub zero_rows: Vec<String>,
    pub kept_columns: Option<Vec<String>>,
    pub collapsed_columns: Option<Vec<String>>,
    /// (row label, dominant column label) pairs.
    pub majority_labels: Vec<(String, String)>,
}

fn fmt_score(score: Option<f64>) -> String {
    score.map_or_else(|| "n/a".to_string(), |s| format!("{:.4}", s))
}

impl std::fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Report: {}", self.name)?;
        writeln!(f, "  Rows ({}):    {}", self.row_column, self.n_rows)?;
        writeln!(f, "  Columns ({}): {}", self.col_column, self.n_cols)?;
        writeln!(f, "  Observations: {}", self.n_observations)?;
        writeln!(f, "  ARI:          {}", fmt_score(self.ari))?;
        writeln!(f, "  NMI:          {}", fmt_score(self.nmi))?;
        writeln!(f, "  Purity:       {:.2}%", self.purity * 100.0)?;
        if let (Some(kept), Some(collapsed)) = (&self.kept_columns, &self.collapsed_columns) {
            writeln!(f, "  Kept columns:      {}", kept.join(", "))?;
            writeln!(f, "  Collapsed columns: {}", collapsed.join(", "))?;
        }
        if !self.zero_rows.is_empty() {
            writeln!(f, "  Empty rows:   {}", self.zero_rows.join(", "))?;
        }
        if !self.majority_labels.is_empty() {
            writeln!(f, "  Majority labels:")?;
            for (row, col) in &self.majority_labels {
                writeln!(f, "    {} -> {}", row, col)?;
            }
        }
        Ok(())
    }
}
