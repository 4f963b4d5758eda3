//! Concordance - cluster vs cell-type cross-tabulation CLI
//!
//! Command-line interface for building and summarising contingency tables
//! between two label columns of an observation table.

use clap::{Parser, Subcommand, ValueEnum};
use cluster_concordance::data::{LabelOrder, LabelTable};
use cluster_concordance::error::Result;
use cluster_concordance::normalize::{
    normalize_rows, select_and_collapse_columns, ZeroRowPolicy, MAX_DECIMALS,
};
use cluster_concordance::profile::profile_agreement;
use cluster_concordance::report::{Report, ReportConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI-friendly ordering enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOrder {
    /// Order of first appearance in the table
    First,
    /// Plain string order
    Lexical,
    /// Numeric-aware order (2 before 10)
    Natural,
}

impl From<CliOrder> for LabelOrder {
    fn from(order: CliOrder) -> Self {
        match order {
            CliOrder::First => LabelOrder::FirstAppearance,
            CliOrder::Lexical => LabelOrder::Lexical,
            CliOrder::Natural => LabelOrder::Natural,
        }
    }
}

/// Output format for profiles
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Cross-tabulate cluster assignments against cell-type labels
#[derive(Parser)]
#[command(name = "concordance")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a single contingency table
    Crosstab {
        /// Path to the label table (TSV, or CSV with a .csv extension)
        #[arg(short, long)]
        labels: PathBuf,

        /// Column used for rows (e.g. seurat_clusters)
        #[arg(short, long)]
        rows: String,

        /// Column used for columns (e.g. predicted_celltype)
        #[arg(short, long)]
        cols: String,

        /// Write row percentages instead of counts
        #[arg(long)]
        percent: bool,

        /// Collapse columns whose largest share is below this percentage
        #[arg(long)]
        min_share: Option<f64>,

        /// Comma-separated column names to put first
        #[arg(long, value_delimiter = ',')]
        canonical: Vec<String>,

        /// Row ordering
        #[arg(long, value_enum, default_value = "first")]
        row_order: CliOrder,

        /// Decimals for percentages (at most 10)
        #[arg(long, default_value = "2", value_parser = clap::value_parser!(u32).range(0..=MAX_DECIMALS as i64))]
        decimals: u32,

        /// Output TSV path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a report from a YAML configuration file
    Run {
        /// Path to report configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Path to the label table
        #[arg(short, long)]
        labels: PathBuf,

        /// Output directory for report tables
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print agreement scores between two label columns
    Profile {
        /// Path to the label table
        #[arg(short, long)]
        labels: PathBuf,

        /// Column used for rows
        #[arg(short, long)]
        rows: String,

        /// Column used for columns
        #[arg(short, long)]
        cols: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate an example report configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "report.yaml")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .init();

    let result = match cli.command {
        Commands::Crosstab {
            labels,
            rows,
            cols,
            percent,
            min_share,
            canonical,
            row_order,
            decimals,
            output,
        } => cmd_crosstab(
            &labels,
            &rows,
            &cols,
            percent,
            min_share,
            &canonical,
            row_order.into(),
            decimals,
            output.as_deref(),
        ),

        Commands::Run {
            config,
            labels,
            output,
        } => cmd_run(&config, &labels, &output),

        Commands::Profile {
            labels,
            rows,
            cols,
            format,
        } => cmd_profile(&labels, &rows, &cols, format),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// Load a label table, choosing the delimiter from the file extension.
fn load_labels(path: &Path) -> Result<LabelTable> {
    info!(path = %path.display(), "loading label table");
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    let table = if is_csv {
        LabelTable::from_csv(path)?
    } else {
        LabelTable::from_tsv(path)?
    };
    info!(
        n_observations = table.n_observations(),
        n_columns = table.column_names().len(),
        "loaded label table"
    );
    Ok(table)
}

/// Build one table and print or write it
#[allow(clippy::too_many_arguments)]
fn cmd_crosstab(
    labels_path: &Path,
    rows: &str,
    cols: &str,
    percent: bool,
    min_share: Option<f64>,
    canonical: &[String],
    row_order: LabelOrder,
    decimals: u32,
    output: Option<&Path>,
) -> Result<()> {
    let labels = load_labels(labels_path)?;
    let mut counts = labels.crosstab(rows, cols)?.sort_rows(row_order);
    if !canonical.is_empty() {
        counts = counts.reorder_columns(canonical)?;
    }

    let mut buffer: Vec<u8> = Vec::new();
    match (percent || min_share.is_some(), min_share) {
        (false, _) => counts.write_tsv(&mut buffer)?,
        (true, None) => {
            let pct = normalize_rows(&counts, ZeroRowPolicy::Zero)?;
            pct.write_tsv(&mut buffer, decimals)?;
        }
        (true, Some(threshold)) => {
            let pct = normalize_rows(&counts, ZeroRowPolicy::Zero)?;
            let collapsed = select_and_collapse_columns(&pct, threshold)?;
            info!(
                kept = collapsed.kept_labels.len(),
                collapsed = collapsed.collapsed_labels.len(),
                "collapsed columns below {}%",
                threshold
            );
            collapsed.write_tsv(&mut buffer, decimals)?;
        }
    }

    match output {
        Some(path) => {
            std::fs::write(path, &buffer)?;
            info!(path = %path.display(), "wrote table");
        }
        None => std::io::stdout().write_all(&buffer)?,
    }
    Ok(())
}

/// Run a report from configuration
fn cmd_run(config_path: &Path, labels_path: &Path, output_dir: &Path) -> Result<()> {
    info!(path = %config_path.display(), "loading report configuration");
    let config_str = std::fs::read_to_string(config_path)?;
    let config = ReportConfig::from_yaml(&config_str)?;

    let labels = load_labels(labels_path)?;
    let report = Report::from_config(&config).run(&labels)?;
    report.write_tsv_dir(output_dir)?;

    eprint!("{}", report.summary());
    Ok(())
}

/// Print agreement scores
fn cmd_profile(labels_path: &Path, rows: &str, cols: &str, format: OutputFormat) -> Result<()> {
    let labels = load_labels(labels_path)?;
    let counts = labels.crosstab(rows, cols)?;
    let agreement = profile_agreement(&counts)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&agreement)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&agreement)?),
        OutputFormat::Text => print!("{}", agreement),
    }
    Ok(())
}

/// Generate example report configuration
fn cmd_example(output_path: &Path) -> Result<()> {
    let report = Report::new("seurat_clusters", "predicted_celltype")
        .name("clusters-vs-celltypes")
        .row_order(LabelOrder::Natural)
        .canonical_columns(&["B", "CD4 T", "CD8 T", "NK", "Mono", "DC"])
        .collapse_below(10.0);

    let config = report.to_config(Some(
        "Compare unsupervised clusters with reference-mapped cell types",
    ));
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    info!(path = %output_path.display(), "wrote example report configuration");
    println!("{}", yaml);
    Ok(())
}
