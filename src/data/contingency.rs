//! Contingency (confusion) matrix between two categorical labelings.

use crate::data::order::LabelOrder;
use crate::error::{ConcordanceError, LabelSide, Result};
use sprs::{CsMat, TriMat};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Distinct values of one label sequence, in first-appearance order.
#[derive(Debug, Default)]
struct Domain {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl Domain {
    fn intern(&mut self, label: &str) -> usize {
        if let Some(&idx) = self.index.get(label) {
            return idx;
        }
        let idx = self.labels.len();
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), idx);
        idx
    }
}

fn index_labels(labels: &[String], side: LabelSide) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(labels.len());
    for (i, label) in labels.iter().enumerate() {
        if index.insert(label.clone(), i).is_some() {
            return Err(ConcordanceError::InvalidInput(format!(
                "Duplicate {} label '{}'",
                side, label
            )));
        }
    }
    Ok(index)
}

/// Co-occurrence counts between the distinct values of two label sequences.
///
/// Rows hold the first labeling (e.g. cluster ids), columns the second
/// (e.g. predicted cell types). Counts are stored in CSR format since most
/// cluster/cell-type combinations never co-occur.
#[derive(Debug, Clone)]
pub struct ContingencyMatrix {
    /// Sparse counts (rows × columns)
    data: CsMat<u64>,
    /// Row labels in display order
    row_labels: Vec<String>,
    /// Column labels in display order
    col_labels: Vec<String>,
    row_index: HashMap<String, usize>,
    col_index: HashMap<String, usize>,
}

impl ContingencyMatrix {
    /// Create a matrix from precomputed counts and labels.
    ///
    /// Labels must be unique within each side and match the matrix shape.
    pub fn new(data: CsMat<u64>, row_labels: Vec<String>, col_labels: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != row_labels.len() || ncols != col_labels.len() {
            return Err(ConcordanceError::InvalidInput(format!(
                "Matrix shape {}x{} does not match {} row and {} column labels",
                nrows,
                ncols,
                row_labels.len(),
                col_labels.len()
            )));
        }
        let row_index = index_labels(&row_labels, LabelSide::Rows)?;
        let col_index = index_labels(&col_labels, LabelSide::Columns)?;
        let data = if data.is_csr() { data } else { data.to_csr() };

        Ok(Self {
            data,
            row_labels,
            col_labels,
            row_index,
            col_index,
        })
    }

    /// Cross-tabulate two parallel label sequences.
    ///
    /// Row and column domains are the distinct values of `labels_a` and
    /// `labels_b` in order of first appearance. Every observation adds
    /// exactly one count, so the matrix total equals the sequence length.
    ///
    /// # Example
    /// ```
    /// use cluster_concordance::data::ContingencyMatrix;
    ///
    /// let clusters = ["0", "0", "1", "1", "1"];
    /// let celltypes = ["B", "T", "B", "B", "T"];
    /// let table = ContingencyMatrix::build(&clusters, &celltypes).unwrap();
    ///
    /// assert_eq!(table.row_labels(), &["0", "1"]);
    /// assert_eq!(table.col_labels(), &["B", "T"]);
    /// assert_eq!(table.get(1, 0), 2);
    /// assert_eq!(table.total(), 5);
    /// ```
    pub fn build<A, B>(labels_a: &[A], labels_b: &[B]) -> Result<Self>
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        if labels_a.len() != labels_b.len() {
            return Err(ConcordanceError::LengthMismatch {
                rows: labels_a.len(),
                cols: labels_b.len(),
            });
        }

        Self::tabulate(
            labels_a
                .iter()
                .zip(labels_b.iter())
                .map(|(a, b)| (a.as_ref(), b.as_ref())),
        )
    }

    /// Cross-tabulate label sequences that may contain missing values.
    ///
    /// Fails on the first missing label instead of silently dropping the
    /// observation.
    pub fn build_with_missing<A, B>(labels_a: &[Option<A>], labels_b: &[Option<B>]) -> Result<Self>
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        if labels_a.len() != labels_b.len() {
            return Err(ConcordanceError::LengthMismatch {
                rows: labels_a.len(),
                cols: labels_b.len(),
            });
        }

        let mut pairs = Vec::with_capacity(labels_a.len());
        for (index, (a, b)) in labels_a.iter().zip(labels_b.iter()).enumerate() {
            let a = a.as_ref().ok_or(ConcordanceError::MissingLabel {
                index,
                side: LabelSide::Rows,
            })?;
            let b = b.as_ref().ok_or(ConcordanceError::MissingLabel {
                index,
                side: LabelSide::Columns,
            })?;
            pairs.push((a.as_ref(), b.as_ref()));
        }

        Self::tabulate(pairs.into_iter())
    }

    fn tabulate<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut rows = Domain::default();
        let mut cols = Domain::default();
        let mut cells: HashMap<(usize, usize), u64> = HashMap::new();
        let mut n_obs = 0usize;

        for (a, b) in pairs {
            let r = rows.intern(a);
            let c = cols.intern(b);
            *cells.entry((r, c)).or_insert(0) += 1;
            n_obs += 1;
        }

        let mut tri_mat = TriMat::with_capacity((rows.labels.len(), cols.labels.len()), cells.len());
        for ((r, c), count) in cells {
            tri_mat.add_triplet(r, c, count);
        }

        debug!(
            n_obs,
            n_rows = rows.labels.len(),
            n_cols = cols.labels.len(),
            "built contingency matrix"
        );

        Ok(Self {
            data: tri_mat.to_csr(),
            row_labels: rows.labels,
            col_labels: cols.labels,
            row_index: rows.index,
            col_index: cols.index,
        })
    }

    /// Get the count at (row, col), returning 0 for empty cells.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.data.get(row, col).copied().unwrap_or(0)
    }

    /// Get the count for a pair of labels, or None if either label is unknown.
    pub fn get_by_label(&self, row: &str, col: &str) -> Option<u64> {
        let r = self.row_index(row)?;
        let c = self.col_index(col)?;
        Some(self.get(r, c))
    }

    /// Number of distinct row labels.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.data.rows()
    }

    /// Number of distinct column labels.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.data.cols()
    }

    /// True if the matrix has no cells.
    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0 || self.n_cols() == 0
    }

    #[inline]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    #[inline]
    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    /// Position of a row label.
    pub fn row_index(&self, label: &str) -> Option<usize> {
        self.row_index.get(label).copied()
    }

    /// Position of a column label.
    pub fn col_index(&self, label: &str) -> Option<usize> {
        self.col_index.get(label).copied()
    }

    /// Get the underlying sparse matrix.
    #[inline]
    pub fn data(&self) -> &CsMat<u64> {
        &self.data
    }

    /// Dense counts for one row.
    pub fn row_dense(&self, row: usize) -> Vec<u64> {
        let mut dense = vec![0u64; self.n_cols()];
        if let Some(row_vec) = self.data.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                dense[col] = val;
            }
        }
        dense
    }

    /// Marginal totals per row.
    pub fn row_sums(&self) -> Vec<u64> {
        self.data
            .outer_iterator()
            .map(|row_vec| row_vec.iter().map(|(_, &val)| val).sum())
            .collect()
    }

    /// Marginal totals per column.
    pub fn col_sums(&self) -> Vec<u64> {
        let mut sums = vec![0u64; self.n_cols()];
        for row_vec in self.data.outer_iterator() {
            for (col, &val) in row_vec.iter() {
                sums[col] += val;
            }
        }
        sums
    }

    /// Total number of observations.
    pub fn total(&self) -> u64 {
        self.data.data().iter().sum()
    }

    /// Convert to a dense matrix (f64).
    pub fn to_dense(&self) -> nalgebra::DMatrix<f64> {
        let mut dense = nalgebra::DMatrix::zeros(self.n_rows(), self.n_cols());
        for (row, row_vec) in self.data.outer_iterator().enumerate() {
            for (col, &val) in row_vec.iter() {
                dense[(row, col)] = val as f64;
            }
        }
        dense
    }

    /// Swap rows and columns.
    pub fn transpose(&self) -> Self {
        let mut tri_mat = TriMat::with_capacity((self.n_cols(), self.n_rows()), self.data.nnz());
        for (row, row_vec) in self.data.outer_iterator().enumerate() {
            for (col, &val) in row_vec.iter() {
                tri_mat.add_triplet(col, row, val);
            }
        }
        Self {
            data: tri_mat.to_csr(),
            row_labels: self.col_labels.clone(),
            col_labels: self.row_labels.clone(),
            row_index: self.col_index.clone(),
            col_index: self.row_index.clone(),
        }
    }

    /// Rearrange rows and columns without touching the counts.
    ///
    /// `row_perm[k]` is the current index of the row that moves to position
    /// `k`; likewise for `col_perm`. Both must be permutations.
    fn permute(&self, row_perm: &[usize], col_perm: &[usize]) -> Self {
        let mut new_row = vec![0usize; row_perm.len()];
        for (new, &old) in row_perm.iter().enumerate() {
            new_row[old] = new;
        }
        let mut new_col = vec![0usize; col_perm.len()];
        for (new, &old) in col_perm.iter().enumerate() {
            new_col[old] = new;
        }

        let mut tri_mat = TriMat::with_capacity((self.n_rows(), self.n_cols()), self.data.nnz());
        for (row, row_vec) in self.data.outer_iterator().enumerate() {
            for (col, &val) in row_vec.iter() {
                tri_mat.add_triplet(new_row[row], new_col[col], val);
            }
        }

        let row_labels: Vec<String> = row_perm.iter().map(|&i| self.row_labels[i].clone()).collect();
        let col_labels: Vec<String> = col_perm.iter().map(|&i| self.col_labels[i].clone()).collect();
        let row_index = row_labels.iter().cloned().zip(0..).collect();
        let col_index = col_labels.iter().cloned().zip(0..).collect();

        Self {
            data: tri_mat.to_csr(),
            row_labels,
            col_labels,
            row_index,
            col_index,
        }
    }

    /// Reorder columns to follow a canonical list of column names.
    ///
    /// Named columns come first in the given order; observed columns not in
    /// the list keep their relative order after them. A name that never
    /// occurs in the data is an error.
    pub fn reorder_columns<S: AsRef<str>>(&self, canonical: &[S]) -> Result<Self> {
        let head = canonical_positions(canonical, &self.col_index, LabelSide::Columns)?;
        let perm = complete_permutation(head, self.n_cols());
        let identity: Vec<usize> = (0..self.n_rows()).collect();
        Ok(self.permute(&identity, &perm))
    }

    /// Reorder rows to follow a canonical list of row names.
    ///
    /// Same contract as [`reorder_columns`](Self::reorder_columns).
    pub fn reorder_rows<S: AsRef<str>>(&self, canonical: &[S]) -> Result<Self> {
        let head = canonical_positions(canonical, &self.row_index, LabelSide::Rows)?;
        let perm = complete_permutation(head, self.n_rows());
        let identity: Vec<usize> = (0..self.n_cols()).collect();
        Ok(self.permute(&perm, &identity))
    }

    /// Sort the row domain with an ordering strategy.
    pub fn sort_rows(&self, order: LabelOrder) -> Self {
        let perm = order.permutation(&self.row_labels);
        let identity: Vec<usize> = (0..self.n_cols()).collect();
        self.permute(&perm, &identity)
    }

    /// Sort the column domain with an ordering strategy.
    pub fn sort_cols(&self, order: LabelOrder) -> Self {
        let perm = order.permutation(&self.col_labels);
        let identity: Vec<usize> = (0..self.n_rows()).collect();
        self.permute(&identity, &perm)
    }

    /// Write the counts to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_tsv(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the counts as tab-separated text.
    pub fn write_tsv<W: Write>(&self, writer: &mut W) -> Result<()> {
        write!(writer, "label")?;
        for col_label in &self.col_labels {
            write!(writer, "\t{}", col_label)?;
        }
        writeln!(writer)?;

        for (row, row_label) in self.row_labels.iter().enumerate() {
            write!(writer, "{}", row_label)?;
            for value in self.row_dense(row) {
                write!(writer, "\t{}", value)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

fn canonical_positions<S: AsRef<str>>(
    canonical: &[S],
    index: &HashMap<String, usize>,
    side: LabelSide,
) -> Result<Vec<usize>> {
    let mut seen = HashSet::new();
    let mut positions = Vec::with_capacity(canonical.len());
    for name in canonical {
        let name = name.as_ref();
        if !seen.insert(name) {
            return Err(ConcordanceError::InvalidParameter(format!(
                "Canonical {} list names '{}' more than once",
                side, name
            )));
        }
        let pos = index.get(name).copied().ok_or_else(|| match side {
            LabelSide::Rows => ConcordanceError::UnknownRow(name.to_string()),
            LabelSide::Columns => ConcordanceError::UnknownColumn(name.to_string()),
        })?;
        positions.push(pos);
    }
    Ok(positions)
}

fn complete_permutation(mut head: Vec<usize>, len: usize) -> Vec<usize> {
    let named: HashSet<usize> = head.iter().copied().collect();
    head.extend((0..len).filter(|i| !named.contains(i)));
    head
}
