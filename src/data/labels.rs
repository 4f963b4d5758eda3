//! Per-observation label tables (e.g. cell barcodes with cluster and cell-type columns).

use crate::data::ContingencyMatrix;
use crate::error::{ConcordanceError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Cell values treated as missing labels.
const MISSING_TOKENS: [&str; 4] = ["", "NA", "na", "NaN"];

fn parse_label(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if MISSING_TOKENS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A table of categorical labels, one row per observation.
///
/// The first column holds observation identifiers; every other column is a
/// labeling of the same observations.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    /// Observation IDs in file order.
    observation_ids: Vec<String>,
    /// Column names (excluding the ID column).
    column_names: Vec<String>,
    /// Column name -> labels, parallel to `observation_ids`.
    columns: HashMap<String, Vec<Option<String>>>,
}

impl LabelTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from in-memory columns.
    ///
    /// Every column must have one entry per observation.
    pub fn from_columns(
        observation_ids: Vec<String>,
        columns: Vec<(String, Vec<Option<String>>)>,
    ) -> Result<Self> {
        let mut column_names = Vec::with_capacity(columns.len());
        let mut by_name = HashMap::with_capacity(columns.len());

        for (name, values) in columns {
            if values.len() != observation_ids.len() {
                return Err(ConcordanceError::InvalidInput(format!(
                    "Column '{}' has {} values for {} observations",
                    name,
                    values.len(),
                    observation_ids.len()
                )));
            }
            if by_name.insert(name.clone(), values).is_some() {
                return Err(ConcordanceError::InvalidInput(format!(
                    "Duplicate column '{}'",
                    name
                )));
            }
            column_names.push(name);
        }

        Ok(Self {
            observation_ids,
            column_names,
            columns: by_name,
        })
    }

    /// Load a label table from a TSV file.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, b'\t')
    }

    /// Load a label table from a CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, b',')
    }

    /// Load a label table from any delimited source.
    ///
    /// Expected format:
    /// - First row: header (first column is the observation ID header)
    /// - Subsequent rows: observation ID followed by labels
    ///
    /// Empty cells and `NA`/`na`/`NaN` are stored as missing labels. Short
    /// rows are padded with missing labels.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let header = csv_reader.headers()?.clone();
        if header.is_empty() {
            return Err(ConcordanceError::EmptyData("Empty label table".to_string()));
        }
        if header.len() < 2 {
            return Err(ConcordanceError::EmptyData(
                "Label table must have at least one label column".to_string(),
            ));
        }
        let column_names: Vec<String> = header.iter().skip(1).map(|s| s.trim().to_string()).collect();

        let mut observation_ids = Vec::new();
        let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); column_names.len()];

        for record in csv_reader.records() {
            let record = record?;
            let Some(id) = record.get(0) else {
                continue;
            };
            if record.len() == 1 && id.trim().is_empty() {
                continue;
            }
            observation_ids.push(id.trim().to_string());
            for (col_idx, column) in values.iter_mut().enumerate() {
                column.push(record.get(col_idx + 1).and_then(parse_label));
            }
        }

        debug!(
            n_observations = observation_ids.len(),
            n_columns = column_names.len(),
            "loaded label table"
        );

        Self::from_columns(observation_ids, column_names.into_iter().zip(values).collect())
    }

    /// Observation IDs in order.
    pub fn observation_ids(&self) -> &[String] {
        &self.observation_ids
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of observations.
    pub fn n_observations(&self) -> usize {
        self.observation_ids.len()
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Get all labels for a column.
    pub fn column(&self, column: &str) -> Result<&[Option<String>]> {
        self.columns
            .get(column)
            .map(Vec::as_slice)
            .ok_or_else(|| ConcordanceError::MissingColumn(column.to_string()))
    }

    /// Number of missing labels in a column.
    pub fn n_missing(&self, column: &str) -> Result<usize> {
        Ok(self.column(column)?.iter().filter(|v| v.is_none()).count())
    }

    /// Cross-tabulate two columns of the table.
    pub fn crosstab(&self, row_column: &str, col_column: &str) -> Result<ContingencyMatrix> {
        let rows = self.column(row_column)?;
        let cols = self.column(col_column)?;
        ContingencyMatrix::build_with_missing(rows, cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LabelSide;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_tsv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "barcode\tseurat_clusters\tpredicted_celltype").unwrap();
        writeln!(file, "AAAC-1\t0\tB").unwrap();
        writeln!(file, "AAAG-1\t0\tT").unwrap();
        writeln!(file, "AACT-1\t1\tB").unwrap();
        writeln!(file, "AAGT-1\t1\tB").unwrap();
        writeln!(file, "ACGT-1\t1\tT").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_tsv() {
        let file = create_test_tsv();
        let table = LabelTable::from_tsv(file.path()).unwrap();

        assert_eq!(table.n_observations(), 5);
        assert_eq!(table.column_names(), &["seurat_clusters", "predicted_celltype"]);
        assert_eq!(table.observation_ids()[2], "AACT-1");
        assert_eq!(
            table.column("predicted_celltype").unwrap()[1].as_deref(),
            Some("T")
        );
    }

    #[test]
    fn test_load_csv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "cell,cluster,celltype").unwrap();
        writeln!(file, "c1,3,NK").unwrap();
        writeln!(file, "c2,3,\"CD4 T\"").unwrap();
        file.flush().unwrap();

        let table = LabelTable::from_csv(file.path()).unwrap();
        assert_eq!(table.n_observations(), 2);
        assert_eq!(table.column("celltype").unwrap()[1].as_deref(), Some("CD4 T"));
    }

    #[test]
    fn test_crosstab() {
        let file = create_test_tsv();
        let table = LabelTable::from_tsv(file.path()).unwrap();
        let matrix = table.crosstab("seurat_clusters", "predicted_celltype").unwrap();

        assert_eq!(matrix.row_labels(), &["0", "1"]);
        assert_eq!(matrix.col_labels(), &["B", "T"]);
        assert_eq!(matrix.row_dense(1), vec![2, 1]);
    }

    #[test]
    fn test_missing_column() {
        let file = create_test_tsv();
        let table = LabelTable::from_tsv(file.path()).unwrap();
        let err = table.crosstab("seurat_clusters", "celltype").unwrap_err();
        assert!(matches!(err, ConcordanceError::MissingColumn(ref c) if c == "celltype"));
    }

    #[test]
    fn test_missing_labels() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id\tcluster\tcelltype").unwrap();
        writeln!(file, "c1\t0\tB").unwrap();
        writeln!(file, "c2\tNA\tT").unwrap();
        writeln!(file, "c3\t1").unwrap();
        file.flush().unwrap();

        let table = LabelTable::from_tsv(file.path()).unwrap();
        assert_eq!(table.n_missing("cluster").unwrap(), 1);
        assert_eq!(table.n_missing("celltype").unwrap(), 1);

        let err = table.crosstab("cluster", "celltype").unwrap_err();
        assert!(matches!(
            err,
            ConcordanceError::MissingLabel {
                index: 1,
                side: LabelSide::Rows
            }
        ));
    }

    #[test]
    fn test_header_only_table() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id\tcluster\tcelltype").unwrap();
        file.flush().unwrap();

        let table = LabelTable::from_tsv(file.path()).unwrap();
        assert_eq!(table.n_observations(), 0);
        let matrix = table.crosstab("cluster", "celltype").unwrap();
        assert!(matrix.is_empty());
    }

    #[test]
    fn test_no_label_columns() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id").unwrap();
        writeln!(file, "c1").unwrap();
        file.flush().unwrap();

        let result = LabelTable::from_tsv(file.path());
        assert!(matches!(result, Err(ConcordanceError::EmptyData(_))));
    }

    #[test]
    fn test_from_columns_length_check() {
        let result = LabelTable::from_columns(
            vec!["c1".into(), "c2".into()],
            vec![("cluster".into(), vec![Some("0".into())])],
        );
        assert!(matches!(result, Err(ConcordanceError::InvalidInput(_))));
    }
}
