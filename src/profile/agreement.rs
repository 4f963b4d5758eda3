//! Partition agreement scores computed directly from a contingency matrix.

use crate::data::ContingencyMatrix;
use crate::error::{ConcordanceError, Result};
use crate::profile::purity::profile_purity;
use serde::{Deserialize, Serialize};

fn c2(x: u64) -> f64 {
    let x = x as f64;
    x * (x - 1.0) / 2.0
}

fn require_observations(matrix: &ContingencyMatrix) -> Result<f64> {
    let n = matrix.total();
    if n == 0 {
        return Err(ConcordanceError::EmptyData(
            "Cannot score agreement of an empty contingency matrix".to_string(),
        ));
    }
    Ok(n as f64)
}

/// Adjusted Rand Index between the row and column partitions.
///
/// 1 for identical partitions, around 0 for independent ones, and may be
/// negative. Trivial partitions (one label on each side, or every
/// observation unique on both sides) score 1.
pub fn adjusted_rand_index(matrix: &ContingencyMatrix) -> Result<f64> {
    let n = require_observations(matrix)?;
    let n_rows = matrix.n_rows();
    let n_cols = matrix.n_cols();

    if (n_rows == 1 && n_cols == 1) || (n_rows as f64 == n && n_cols as f64 == n) {
        return Ok(1.0);
    }

    let sum_comb_c: f64 = matrix.data().data().iter().map(|&x| c2(x)).sum();
    let sum_comb_a: f64 = matrix.row_sums().into_iter().map(c2).sum();
    let sum_comb_b: f64 = matrix.col_sums().into_iter().map(c2).sum();
    let comb_n = n * (n - 1.0) / 2.0;

    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;
    let denom = max_index - expected;

    if denom.abs() < 1e-15 {
        return Ok(0.0);
    }

    Ok((sum_comb_c - expected) / denom)
}

fn entropy(marginals: &[u64], n: f64) -> f64 {
    marginals
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.ln()
        })
        .sum()
}

/// Normalized Mutual Information (arithmetic-mean normalization), in [0, 1].
///
/// Two single-label partitions are identical and score 1.
pub fn normalized_mutual_info(matrix: &ContingencyMatrix) -> Result<f64> {
    let n = require_observations(matrix)?;
    let row_sums = matrix.row_sums();
    let col_sums = matrix.col_sums();

    let mut mi = 0.0;
    for (i, row_vec) in matrix.data().outer_iterator().enumerate() {
        for (j, &count) in row_vec.iter() {
            if count > 0 {
                let nij = count as f64;
                mi += nij / n * (n * nij / (row_sums[i] as f64 * col_sums[j] as f64)).ln();
            }
        }
    }

    let h_a = entropy(&row_sums, n);
    let h_b = entropy(&col_sums, n);

    if h_a == 0.0 && h_b == 0.0 {
        return Ok(1.0);
    }

    let denom = (h_a + h_b) / 2.0;
    Ok((mi / denom).clamp(0.0, 1.0))
}

/// Summary of how well two labelings agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementProfile {
    /// Number of observations.
    pub n_observations: u64,
    /// Number of distinct row labels.
    pub n_rows: usize,
    /// Number of distinct column labels.
    pub n_cols: usize,
    /// Adjusted Rand Index.
    pub ari: f64,
    /// Normalized Mutual Information.
    pub nmi: f64,
    /// Share of observations carrying their row's dominant column label.
    pub purity: f64,
    /// Share of observations carrying their column's dominant row label.
    pub inverse_purity: f64,
}

impl std::fmt::Display for AgreementProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Agreement Profile")?;
        writeln!(f, "  Observations:    {}", self.n_observations)?;
        writeln!(f, "  Row labels:      {}", self.n_rows)?;
        writeln!(f, "  Column labels:   {}", self.n_cols)?;
        writeln!(f, "  ARI:             {:.4}", self.ari)?;
        writeln!(f, "  NMI:             {:.4}", self.nmi)?;
        writeln!(f, "  Purity:          {:.2}%", self.purity * 100.0)?;
        writeln!(f, "  Inverse purity:  {:.2}%", self.inverse_purity * 100.0)?;
        Ok(())
    }
}

/// Compute all agreement scores for a contingency matrix.
pub fn profile_agreement(matrix: &ContingencyMatrix) -> Result<AgreementProfile> {
    let ari = adjusted_rand_index(matrix)?;
    let nmi = normalized_mutual_info(matrix)?;
    let purity = profile_purity(matrix).overall_purity;
    let inverse_purity = profile_purity(&matrix.transpose()).overall_purity;

    Ok(AgreementProfile {
        n_observations: matrix.total(),
        n_rows: matrix.n_rows(),
        n_cols: matrix.n_cols(),
        ari,
        nmi,
        purity,
        inverse_purity,
    })
}
