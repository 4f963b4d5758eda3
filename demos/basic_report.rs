//! Basic example of a cluster vs cell-type report.
//!
//! This example shows how to:
//! 1. Build a contingency table from two label vectors
//! 2. Put known cell types first and sort clusters numerically
//! 3. Convert counts to row percentages and collapse rare cell types
//! 4. Examine purity and agreement scores

use cluster_concordance::prelude::*;

fn main() -> Result<()> {
    println!("=== Cluster Concordance Example ===\n");

    let (clusters, celltypes) = create_example_labels();
    println!("Observations: {}\n", clusters.len());

    let counts = ContingencyMatrix::build(&clusters, &celltypes)?
        .sort_rows(LabelOrder::Natural)
        .reorder_columns(&["B", "CD4 T", "CD8 T", "NK", "Mono"])?;

    println!("=== Counts ===\n");
    let mut stdout = std::io::stdout();
    counts.write_tsv(&mut stdout)?;
    println!();

    let pct = normalize_rows(&counts, ZeroRowPolicy::Zero)?;
    println!("=== Row percentages ===\n");
    pct.write_tsv(&mut stdout, 1)?;
    println!();

    let collapsed = select_and_collapse_columns(&pct, 15.0)?;
    println!("=== Collapsed below 15% ===\n");
    println!("Folded into '{}': {:?}\n", collapsed.other_label, collapsed.collapsed_labels);
    collapsed.write_tsv(&mut stdout, 1)?;
    println!();

    println!("=== Majority cell type per cluster ===\n");
    let purity = profile_purity(&counts);
    println!("{:<10} {:<10} {:>8}", "Cluster", "Label", "Purity");
    println!("{}", "-".repeat(30));
    for row in &purity.rows {
        println!(
            "{:<10} {:<10} {:>7.1}%",
            row.row_label,
            row.dominant_label.as_deref().unwrap_or("-"),
            row.purity * 100.0
        );
    }
    println!();

    let agreement = profile_agreement(&counts)?;
    println!("=== Agreement ===\n");
    print!("{}", agreement);

    println!("\n=== Report Configuration (YAML) ===\n");
    let config = Report::new("seurat_clusters", "predicted_celltype")
        .name("pbmc")
        .row_order(LabelOrder::Natural)
        .canonical_columns(&["B", "CD4 T", "CD8 T", "NK", "Mono"])
        .collapse_below(15.0)
        .decimals(1)
        .to_config(Some("Clusters against reference-mapped cell types"));
    println!("{}", config.to_yaml()?);

    Ok(())
}

/// Twelve clusters over a small PBMC-like population.
///
/// Cluster ids are strings so that "10" and "11" show why natural
/// ordering matters.
fn create_example_labels() -> (Vec<String>, Vec<String>) {
    let layout: [(&str, &[(&str, usize)]); 12] = [
        ("0", &[("CD4 T", 40), ("CD8 T", 5)]),
        ("1", &[("Mono", 35), ("DC", 3)]),
        ("2", &[("B", 30)]),
        ("3", &[("CD8 T", 22), ("NK", 6)]),
        ("4", &[("NK", 20), ("CD8 T", 2)]),
        ("5", &[("CD4 T", 18)]),
        ("6", &[("Mono", 15), ("Platelet", 1)]),
        ("7", &[("B", 12), ("DC", 1)]),
        ("8", &[("DC", 6), ("Mono", 4)]),
        ("9", &[("Platelet", 5)]),
        ("10", &[("CD4 T", 4), ("CD8 T", 4)]),
        ("11", &[("NK", 3), ("Eryth", 1)]),
    ];

    let mut clusters = Vec::new();
    let mut celltypes = Vec::new();
    for (cluster, cells) in layout {
        for &(celltype, n) in cells {
            for _ in 0..n {
                clusters.push(cluster.to_string());
                celltypes.push(celltype.to_string());
            }
        }
    }
    (clusters, celltypes)
}
