//! Integration tests for cross-tabulating cluster and cell-type labels.

use approx::assert_relative_eq;
use cluster_concordance::prelude::*;
use proptest::prelude::*;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

/// Synthetic annotation of 60 cells.
///
/// - Clusters 0-2 map cleanly onto B, CD4 T and NK
/// - Cluster 3 is a CD8/CD4 T mixture, mostly CD8
/// - A handful of DC cells are scattered over clusters 0 and 3
fn create_synthetic_labels() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "barcode\tseurat_clusters\tpredicted_celltype\tsample").unwrap();
    for i in 0..60 {
        let (cluster, celltype) = match i {
            0..=13 => ("0", "B"),
            14..=15 => ("0", "DC"),
            16..=31 => ("1", "CD4 T"),
            32..=43 => ("2", "NK"),
            44..=51 => ("3", "CD8 T"),
            52..=57 => ("3", "CD4 T"),
            _ => ("3", "DC"),
        };
        let sample = if i % 2 == 0 { "ctrl" } else { "stim" };
        writeln!(file, "cell_{:03}-1\t{}\t{}\t{}", i, cluster, celltype, sample).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_full_report() {
    let file = create_synthetic_labels();
    let labels = LabelTable::from_tsv(file.path()).unwrap();

    let report = Report::new("seurat_clusters", "predicted_celltype")
        .name("pbmc-test")
        .row_order(LabelOrder::Natural)
        .canonical_columns(&["B", "CD4 T", "CD8 T", "NK"])
        .collapse_below(20.0)
        .run(&labels)
        .unwrap();

    assert_eq!(report.counts.total(), 60);
    assert_eq!(report.counts.row_labels(), &["0", "1", "2", "3"]);
    assert_eq!(report.counts.col_labels(), &["B", "CD4 T", "CD8 T", "NK", "DC"]);

    let collapsed = report.collapsed.as_ref().unwrap();
    // DC peaks at 12.5% in cluster 0
    assert_eq!(collapsed.kept_labels, vec!["B", "CD4 T", "CD8 T", "NK"]);
    assert_eq!(collapsed.collapsed_labels, vec!["DC"]);
    assert_relative_eq!(collapsed.other(0), 12.5, epsilon = 1e-10);
    for i in 0..collapsed.n_rows() {
        assert_relative_eq!(collapsed.row_total(i), 100.0, max_relative = 1e-9);
    }

    let summary = report.summary();
    assert_eq!(summary.n_observations, 60);
    let majority: HashMap<_, _> = summary.majority_labels.into_iter().collect();
    assert_eq!(majority["0"], "B");
    assert_eq!(majority["1"], "CD4 T");
    assert_eq!(majority["2"], "NK");
    assert_eq!(majority["3"], "CD8 T");

    let agreement = report.agreement.as_ref().unwrap();
    assert!(agreement.ari > 0.5, "ARI too low: {}", agreement.ari);
    assert!(agreement.nmi > 0.5, "NMI too low: {}", agreement.nmi);
}

#[test]
fn test_report_from_yaml_and_output_dir() {
    let file = create_synthetic_labels();
    let labels = LabelTable::from_tsv(file.path()).unwrap();

    let yaml = "\
name: from-yaml
row_column: seurat_clusters
col_column: predicted_celltype
row_order: natural
canonical_columns: [NK]
collapse_threshold: 50
decimals: 1
";
    let config = ReportConfig::from_yaml(yaml).unwrap();
    let report = Report::from_config(&config).run(&labels).unwrap();

    let dir = tempfile::tempdir().unwrap();
    report.write_tsv_dir(dir.path()).unwrap();

    let counts = std::fs::read_to_string(dir.path().join("counts.tsv")).unwrap();
    let mut lines = counts.lines();
    assert_eq!(lines.next().unwrap(), "label\tNK\tB\tDC\tCD4 T\tCD8 T");
    assert_eq!(lines.next().unwrap(), "0\t0\t14\t2\t0\t0");

    let collapsed = std::fs::read_to_string(dir.path().join("collapsed.tsv")).unwrap();
    let header = collapsed.lines().next().unwrap();
    assert_eq!(header, "label\tNK\tB\tCD4 T\tCD8 T\tother");
    assert!(collapsed.contains("0\t0.0\t87.5\t0.0\t0.0\t12.5"));
}

#[test]
fn test_missing_label_is_reported() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "barcode,cluster,celltype").unwrap();
    writeln!(file, "a,0,B").unwrap();
    writeln!(file, "b,1,").unwrap();
    file.flush().unwrap();

    let labels = LabelTable::from_csv(file.path()).unwrap();
    let err = Report::new("cluster", "celltype").run(&labels).unwrap_err();
    assert!(err.is_invalid_input());
    assert!(matches!(
        err,
        ConcordanceError::MissingLabel {
            index: 1,
            side: LabelSide::Columns
        }
    ));
}

#[test]
fn test_canonical_column_absent_from_data() {
    let file = create_synthetic_labels();
    let labels = LabelTable::from_tsv(file.path()).unwrap();
    let result = Report::new("seurat_clusters", "predicted_celltype")
        .canonical_columns(&["B", "Platelet"])
        .run(&labels);
    assert!(matches!(result, Err(ConcordanceError::UnknownColumn(ref c)) if c == "Platelet"));
}

#[test]
fn test_reorder_does_not_change_counts() {
    let file = create_synthetic_labels();
    let labels = LabelTable::from_tsv(file.path()).unwrap();
    let table = labels.crosstab("seurat_clusters", "predicted_celltype").unwrap();
    let reordered = table
        .sort_rows(LabelOrder::Lexical)
        .reorder_columns(&["NK", "DC"])
        .unwrap();

    for row in table.row_labels() {
        for col in table.col_labels() {
            assert_eq!(table.get_by_label(row, col), reordered.get_by_label(row, col));
        }
    }
}

fn label_pairs() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    prop::collection::vec(("[a-d]{1,2}", "[A-E]"), 0..80)
        .prop_map(|pairs| pairs.into_iter().unzip())
}

proptest! {
    #[test]
    fn prop_total_equals_observations((a, b) in label_pairs()) {
        let table = ContingencyMatrix::build(&a, &b).unwrap();
        prop_assert_eq!(table.total(), a.len() as u64);
        prop_assert_eq!(table.row_sums().iter().sum::<u64>(), a.len() as u64);
        prop_assert_eq!(table.col_sums().iter().sum::<u64>(), a.len() as u64);
    }

    #[test]
    fn prop_matches_brute_force((a, b) in label_pairs()) {
        let table = ContingencyMatrix::build(&a, &b).unwrap();
        for (r, row) in table.row_labels().iter().enumerate() {
            for (c, col) in table.col_labels().iter().enumerate() {
                let expected = a
                    .iter()
                    .zip(b.iter())
                    .filter(|(x, y)| *x == row && *y == col)
                    .count() as u64;
                prop_assert_eq!(table.get(r, c), expected);
            }
        }
    }

    #[test]
    fn prop_build_is_deterministic((a, b) in label_pairs()) {
        let first = ContingencyMatrix::build(&a, &b).unwrap();
        let second = ContingencyMatrix::build(&a, &b).unwrap();
        prop_assert_eq!(first.row_labels(), second.row_labels());
        prop_assert_eq!(first.col_labels(), second.col_labels());
        prop_assert_eq!(first.to_dense(), second.to_dense());
    }

    #[test]
    fn prop_rows_normalize_to_100((a, b) in label_pairs()) {
        let table = ContingencyMatrix::build(&a, &b).unwrap();
        let pct = normalize_rows(&table, ZeroRowPolicy::Error).unwrap();
        for i in 0..pct.n_rows() {
            prop_assert!((pct.row_total(i) - 100.0).abs() <= 1e-6 * 100.0);
        }
    }

    #[test]
    fn prop_collapse_preserves_row_totals((a, b) in label_pairs(), threshold in 0.0f64..=100.0) {
        let table = ContingencyMatrix::build(&a, &b).unwrap();
        let pct = normalize_rows(&table, ZeroRowPolicy::Zero).unwrap();
        let collapsed = select_and_collapse_columns_with_label(&pct, threshold, "__other__").unwrap();

        prop_assert_eq!(
            collapsed.kept_labels.len() + collapsed.collapsed_labels.len(),
            pct.n_cols()
        );
        for i in 0..pct.n_rows() {
            prop_assert!((collapsed.row_total(i) - pct.row_total(i)).abs() <= 1e-6 * 100.0);
        }
        for kept in &collapsed.kept_labels {
            let j = pct.col_labels.iter().position(|c| c == kept).unwrap();
            prop_assert!(pct.col_max(j) >= threshold);
        }
    }

    #[test]
    fn prop_length_mismatch_is_rejected(a in prop::collection::vec("[a-c]", 1..20), extra in 1usize..5) {
        let b: Vec<String> = a.iter().cloned().chain(std::iter::repeat("x".to_string()).take(extra)).collect();
        let result = ContingencyMatrix::build(&a, &b);
        let is_mismatch = matches!(result, Err(ConcordanceError::LengthMismatch { .. }));
        prop_assert!(is_mismatch);
    }
}
