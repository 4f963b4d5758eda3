//! Row-wise percentage normalization of contingency tables.
//!
//! Each row of counts is divided by its row total and scaled to 100, which
//! turns "how many cells of cluster r carry label c" into "what share of
//! cluster r carries label c".

use crate::data::ContingencyMatrix;
use crate::error::{ConcordanceError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::warn;

/// What to do with a row whose counts sum to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroRowPolicy {
    /// Emit an all-zero row and record it in `zero_rows`.
    #[default]
    Zero,
    /// Fail with `DegenerateInput`.
    Error,
}

/// Largest number of decimals accepted for display output.
pub const MAX_DECIMALS: u32 = 10;

/// Round half away from zero to a fixed number of decimals.
///
/// `decimals` is capped at [`MAX_DECIMALS`].
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.min(MAX_DECIMALS) as i32);
    (value * factor).round() / factor
}

/// Reject decimal counts the TSV writers cannot honour.
pub(crate) fn check_decimals(decimals: u32) -> Result<()> {
    if decimals > MAX_DECIMALS {
        return Err(ConcordanceError::InvalidParameter(format!(
            "decimals must be at most {}, got {}",
            MAX_DECIMALS, decimals
        )));
    }
    Ok(())
}

/// Row-normalized percentages of a contingency matrix.
#[derive(Debug, Clone, Serialize)]
pub struct PercentMatrix {
    /// Percentages (rows × columns).
    #[serde(skip)]
    pub data: DMatrix<f64>,
    /// Row labels.
    pub row_labels: Vec<String>,
    /// Column labels.
    pub col_labels: Vec<String>,
    /// Row totals (counts) before normalization.
    pub row_totals: Vec<u64>,
    /// Indices of rows whose total was zero.
    pub zero_rows: Vec<usize>,
}

impl PercentMatrix {
    /// Get the percentage for a row and column.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    /// Get a row as a vector.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().cloned().collect()
    }

    /// Sum of a row (100 for non-empty rows, up to floating-point error).
    pub fn row_total(&self, row: usize) -> f64 {
        self.data.row(row).sum()
    }

    /// Largest value in a column, 0 for a matrix without rows.
    pub fn col_max(&self, col: usize) -> f64 {
        self.data.column(col).iter().cloned().fold(0.0, f64::max)
    }

    /// Get reference to the underlying matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Copy of the values rounded for display.
    pub fn rounded(&self, decimals: u32) -> DMatrix<f64> {
        self.data.map(|v| round_to(v, decimals))
    }

    /// Write the percentages to a TSV file with fixed decimals.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P, decimals: u32) -> Result<()> {
        check_decimals(decimals)?;
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_tsv(&mut writer, decimals)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the percentages as tab-separated text.
    pub fn write_tsv<W: Write>(&self, writer: &mut W, decimals: u32) -> Result<()> {
        write_percent_tsv(writer, &self.data, &self.row_labels, &self.col_labels, decimals)
    }
}

/// Shared TSV layout for percentage tables.
pub(crate) fn write_percent_tsv<W: Write>(
    writer: &mut W,
    data: &DMatrix<f64>,
    row_labels: &[String],
    col_labels: &[String],
    decimals: u32,
) -> Result<()> {
    check_decimals(decimals)?;
    let precision = decimals as usize;
    write!(writer, "label")?;
    for col_label in col_labels {
        write!(writer, "\t{}", col_label)?;
    }
    writeln!(writer)?;

    for (i, row_label) in row_labels.iter().enumerate() {
        write!(writer, "{}", row_label)?;
        for j in 0..col_labels.len() {
            write!(writer, "\t{:.*}", precision, round_to(data[(i, j)], decimals))?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Convert each row of counts to percentages of the row total.
///
/// # Formula
/// For row r: pct(r, c) = count(r, c) / sum_c(count(r, c)) * 100
///
/// # Arguments
/// * `matrix` - Contingency matrix
/// * `policy` - Handling of rows whose total is zero
///
/// # Example
/// ```
/// use cluster_concordance::data::ContingencyMatrix;
/// use cluster_concordance::normalize::{normalize_rows, ZeroRowPolicy};
///
/// let table = ContingencyMatrix::build(&["0", "0", "1"], &["B", "T", "B"]).unwrap();
/// let pct = normalize_rows(&table, ZeroRowPolicy::Zero).unwrap();
/// assert_eq!(pct.row(0), vec![50.0, 50.0]);
/// assert_eq!(pct.row(1), vec![100.0, 0.0]);
/// ```
pub fn normalize_rows(matrix: &ContingencyMatrix, policy: ZeroRowPolicy) -> Result<PercentMatrix> {
    let n_rows = matrix.n_rows();
    let n_cols = matrix.n_cols();
    let row_totals = matrix.row_sums();

    let mut data = DMatrix::zeros(n_rows, n_cols);
    let mut zero_rows = Vec::new();

    for (i, row_vec) in matrix.data().outer_iterator().enumerate() {
        let total = row_totals[i];
        if total == 0 {
            match policy {
                ZeroRowPolicy::Zero => {
                    warn!(row = %matrix.row_labels()[i], "row has zero total, emitting zeros");
                    zero_rows.push(i);
                    continue;
                }
                ZeroRowPolicy::Error => {
                    return Err(ConcordanceError::DegenerateInput(format!(
                        "Row '{}' has zero total, cannot normalize",
                        matrix.row_labels()[i]
                    )));
                }
            }
        }
        let total = total as f64;
        for (j, &count) in row_vec.iter() {
            data[(i, j)] = count as f64 / total * 100.0;
        }
    }

    Ok(PercentMatrix {
        data,
        row_labels: matrix.row_labels().to_vec(),
        col_labels: matrix.col_labels().to_vec(),
        row_totals,
        zero_rows,
    })
}
