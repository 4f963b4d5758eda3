//! Folding low-share columns of a percentage table into a single "other" column.

use crate::error::{ConcordanceError, Result};
use crate::normalize::rows::{check_decimals, write_percent_tsv, PercentMatrix};
use nalgebra::DMatrix;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Default label of the synthetic aggregate column.
pub const OTHER_LABEL: &str = "other";

/// Percentage table after low-share columns were collapsed.
///
/// Columns are the kept columns in their original order followed by the
/// synthetic aggregate column.
#[derive(Debug, Clone, Serialize)]
pub struct CollapsedMatrix {
    /// Percentages (rows × (kept + 1)).
    #[serde(skip)]
    pub data: DMatrix<f64>,
    /// Row labels.
    pub row_labels: Vec<String>,
    /// Labels of the kept columns.
    pub kept_labels: Vec<String>,
    /// Labels of the columns folded into the aggregate column.
    pub collapsed_labels: Vec<String>,
    /// Label of the aggregate column.
    pub other_label: String,
    /// Minimum column share (percent) used to keep a column.
    pub threshold: f64,
}

impl CollapsedMatrix {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns including the aggregate column.
    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    /// Index of the aggregate column.
    pub fn other_index(&self) -> usize {
        self.kept_labels.len()
    }

    /// Aggregate value for a row.
    pub fn other(&self, row: usize) -> f64 {
        self.data[(row, self.other_index())]
    }

    /// All column labels, aggregate last.
    pub fn col_labels(&self) -> Vec<String> {
        let mut labels = self.kept_labels.clone();
        labels.push(self.other_label.clone());
        labels
    }

    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().cloned().collect()
    }

    pub fn row_total(&self, row: usize) -> f64 {
        self.data.row(row).sum()
    }

    /// Write the table to a TSV file with fixed decimals.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P, decimals: u32) -> Result<()> {
        check_decimals(decimals)?;
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_tsv(&mut writer, decimals)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the table as tab-separated text.
    pub fn write_tsv<W: Write>(&self, writer: &mut W, decimals: u32) -> Result<()> {
        write_percent_tsv(writer, &self.data, &self.row_labels, &self.col_labels(), decimals)
    }
}

/// Keep columns that reach a minimum share somewhere; fold the rest into "other".
///
/// A column is kept when its largest value over all rows is at least
/// `min_column_share_percent`. The remaining columns are summed per row into
/// a trailing `"other"` column, which is present even when nothing was
/// collapsed. Row totals are preserved.
///
/// # Arguments
/// * `matrix` - Row-normalized percentages
/// * `min_column_share_percent` - Threshold in percent (0 to 100)
pub fn select_and_collapse_columns(
    matrix: &PercentMatrix,
    min_column_share_percent: f64,
) -> Result<CollapsedMatrix> {
    select_and_collapse_columns_with_label(matrix, min_column_share_percent, OTHER_LABEL)
}

/// Same as [`select_and_collapse_columns`] with a custom aggregate label.
pub fn select_and_collapse_columns_with_label(
    matrix: &PercentMatrix,
    min_column_share_percent: f64,
    other_label: &str,
) -> Result<CollapsedMatrix> {
    if !(0.0..=100.0).contains(&min_column_share_percent) {
        return Err(ConcordanceError::InvalidParameter(format!(
            "Column share threshold must be between 0 and 100, got {}",
            min_column_share_percent
        )));
    }

    let (kept, collapsed): (Vec<usize>, Vec<usize>) =
        (0..matrix.n_cols()).partition(|&j| matrix.col_max(j) >= min_column_share_percent);

    if kept.iter().any(|&j| matrix.col_labels[j] == other_label) {
        return Err(ConcordanceError::InvalidInput(format!(
            "Kept column '{}' clashes with the aggregate column label; \
             choose another label with select_and_collapse_columns_with_label",
            other_label
        )));
    }

    let n_rows = matrix.n_rows();
    let mut data = DMatrix::zeros(n_rows, kept.len() + 1);
    for i in 0..n_rows {
        for (new_j, &j) in kept.iter().enumerate() {
            data[(i, new_j)] = matrix.get(i, j);
        }
        data[(i, kept.len())] = collapsed.iter().map(|&j| matrix.get(i, j)).sum();
    }

    debug!(
        kept = kept.len(),
        collapsed = collapsed.len(),
        threshold = min_column_share_percent,
        "collapsed low-share columns"
    );

    Ok(CollapsedMatrix {
        data,
        row_labels: matrix.row_labels.clone(),
        kept_labels: kept.iter().map(|&j| matrix.col_labels[j].clone()).collect(),
        collapsed_labels: collapsed.iter().map(|&j| matrix.col_labels[j].clone()).collect(),
        other_label: other_label.to_string(),
        threshold: min_column_share_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ContingencyMatrix;
    use crate::normalize::{normalize_rows, ZeroRowPolicy};
    use approx::assert_relative_eq;

    fn scenario_pct() -> PercentMatrix {
        let a = ["0", "0", "1", "1", "1"];
        let b = ["B", "T", "B", "B", "T"];
        let table = ContingencyMatrix::build(&a, &b).unwrap();
        normalize_rows(&table, ZeroRowPolicy::Zero).unwrap()
    }

    #[test]
    fn test_scenario_threshold_60() {
        let pct = scenario_pct();
        let collapsed = select_and_collapse_columns(&pct, 60.0).unwrap();

        // B peaks at 66.67 in row "1"; T never exceeds 50
        assert_eq!(collapsed.kept_labels, vec!["B"]);
        assert_eq!(collapsed.collapsed_labels, vec!["T"]);
        assert_eq!(collapsed.col_labels(), vec!["B", "other"]);

        assert_relative_eq!(collapsed.get(0, 0), 50.0, epsilon = 1e-10);
        assert_relative_eq!(collapsed.other(0), 50.0, epsilon = 1e-10);
        assert_relative_eq!(collapsed.get(1, 0), 200.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(collapsed.other(1), 100.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let pct = scenario_pct();
        let collapsed = select_and_collapse_columns(&pct, 50.0).unwrap();
        assert_eq!(collapsed.kept_labels, vec!["B", "T"]);
        assert!(collapsed.collapsed_labels.is_empty());
        assert_eq!(collapsed.other(0), 0.0);
        assert_eq!(collapsed.other(1), 0.0);
    }

    #[test]
    fn test_everything_collapsed() {
        let pct = scenario_pct();
        let collapsed = select_and_collapse_columns(&pct, 100.0).unwrap();
        assert!(collapsed.kept_labels.is_empty());
        assert_eq!(collapsed.n_cols(), 1);
        assert_relative_eq!(collapsed.other(0), 100.0, epsilon = 1e-10);
        assert_relative_eq!(collapsed.other(1), 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_row_totals_preserved() {
        let a = ["0", "0", "0", "0", "1", "1", "2", "2", "2", "2"];
        let b = ["B", "B", "T", "NK", "Mono", "B", "T", "T", "T", "DC"];
        let table = ContingencyMatrix::build(&a, &b).unwrap();
        let pct = normalize_rows(&table, ZeroRowPolicy::Zero).unwrap();
        let collapsed = select_and_collapse_columns(&pct, 60.0).unwrap();

        assert_eq!(collapsed.kept_labels, vec!["T"]);
        for i in 0..pct.n_rows() {
            assert_relative_eq!(collapsed.row_total(i), pct.row_total(i), max_relative = 1e-9);
        }
    }

    #[test]
    fn test_invalid_threshold() {
        let pct = scenario_pct();
        assert!(select_and_collapse_columns(&pct, -1.0).is_err());
        assert!(select_and_collapse_columns(&pct, 100.5).is_err());
        assert!(select_and_collapse_columns(&pct, f64::NAN).is_err());
    }

    #[test]
    fn test_to_tsv_rejects_excess_decimals() {
        let collapsed = select_and_collapse_columns(&scenario_pct(), 60.0).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collapsed.tsv");

        let err = collapsed.to_tsv(&path, 309).unwrap_err();
        assert!(matches!(err, ConcordanceError::InvalidParameter(_)));
        assert!(!path.exists());

        collapsed.to_tsv(&path, 2).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "label\tB\tother\n0\t50.00\t50.00\n1\t66.67\t33.33\n");
    }

    #[test]
    fn test_other_label_clash() {
        let a = ["0", "0"];
        let b = ["other", "B"];
        let table = ContingencyMatrix::build(&a, &b).unwrap();
        let pct = normalize_rows(&table, ZeroRowPolicy::Zero).unwrap();

        let err = select_and_collapse_columns(&pct, 10.0).unwrap_err();
        match &err {
            ConcordanceError::InvalidInput(msg) => {
                assert!(msg.contains("'other'"));
                assert!(msg.contains("select_and_collapse_columns_with_label"));
            }
            other => panic!("unexpected error: {}", other),
        }

        let renamed = select_and_collapse_columns_with_label(&pct, 10.0, "rest").unwrap();
        assert_eq!(renamed.col_labels(), vec!["other", "B", "rest"]);
    }
}
