//! Dominant column label per row of a contingency matrix.

use crate::data::ContingencyMatrix;
use serde::{Deserialize, Serialize};

/// Best-matching column for one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowAssignment {
    /// Row label (e.g. cluster id).
    pub row_label: String,
    /// Most frequent column label, None for an empty row.
    pub dominant_label: Option<String>,
    /// Count of the dominant label.
    pub dominant_count: u64,
    /// Row total.
    pub row_total: u64,
    /// dominant_count / row_total, 0 for an empty row.
    pub purity: f64,
}

/// Purity of every row plus the observation-weighted overall purity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurityProfile {
    pub rows: Vec<RowAssignment>,
    /// Share of observations carrying their row's dominant label.
    pub overall_purity: f64,
}

impl PurityProfile {
    /// Rows whose purity falls below a threshold (0.0 to 1.0).
    pub fn impure_rows(&self, threshold: f64) -> Vec<&RowAssignment> {
        self.rows.iter().filter(|r| r.purity < threshold).collect()
    }

    /// Row label -> dominant column label, skipping empty rows.
    ///
    /// This is the usual "name each cluster after its majority cell type"
    /// annotation.
    pub fn majority_labels(&self) -> Vec<(String, String)> {
        self.rows
            .iter()
            .filter_map(|r| {
                r.dominant_label
                    .as_ref()
                    .map(|d| (r.row_label.clone(), d.clone()))
            })
            .collect()
    }
}

/// Find the dominant column of every row.
///
/// Ties go to the column that comes first in the matrix's column order.
pub fn profile_purity(matrix: &ContingencyMatrix) -> PurityProfile {
    let mut rows = Vec::with_capacity(matrix.n_rows());
    let mut dominant_sum = 0u64;
    let mut total = 0u64;

    for (i, row_vec) in matrix.data().outer_iterator().enumerate() {
        let mut best: Option<(usize, u64)> = None;
        let mut row_total = 0u64;
        for (j, &count) in row_vec.iter() {
            row_total += count;
            let better = match best {
                None => count > 0,
                Some((best_j, best_count)) => count > best_count || (count == best_count && j < best_j),
            };
            if better {
                best = Some((j, count));
            }
        }

        let dominant_count = best.map(|(_, c)| c).unwrap_or(0);
        dominant_sum += dominant_count;
        total += row_total;

        rows.push(RowAssignment {
            row_label: matrix.row_labels()[i].clone(),
            dominant_label: best.map(|(j, _)| matrix.col_labels()[j].clone()),
            dominant_count,
            row_total,
            purity: if row_total == 0 {
                0.0
            } else {
                dominant_count as f64 / row_total as f64
            },
        });
    }

    let overall_purity = if total == 0 {
        0.0
    } else {
        dominant_sum as f64 / total as f64
    };

    PurityProfile {
        rows,
        overall_purity,
    }
}
