use std::path::PathBuf;

use clap::Args;

use crate::cli::{load_registry, OutputFormat};
use crate::core::bundle::BundleSummary;
use crate::core::types::{DatasetId, Target, TargetSet};
use crate::dataset::resolver::{BatchLoad, CatalogResolver};
use crate::io::NpyReader;
use crate::utils::validation::expand_home;

#[derive(Args)]
pub struct LoadArgs {
    /// Root directory holding the collection subdirectories (`~` is expanded)
    #[arg(long, required = true)]
    pub data_dir: PathBuf,

    /// Datasets to load (defaults to every dataset in the catalogs)
    #[arg(long, num_args = 1..)]
    pub data_names: Vec<String>,

    /// Targets to assemble, comma-separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub targets: Vec<Target>,

    /// Path to custom catalog file
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Fail if any dataset could not be loaded
    #[arg(long)]
    pub strict: bool,
}

/// Execute load command
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, no targets are
/// requested, or `--strict` is set and any dataset failed.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: LoadArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let registry = load_registry(args.catalog.as_deref())?;
    let data_dir = expand_home(&args.data_dir);
    let targets: TargetSet = args.targets.iter().copied().collect();
    let ids: Vec<DatasetId> = args.data_names.iter().map(DatasetId::new).collect();

    if verbose {
        eprintln!("Data directory: {}", data_dir.display());
        eprintln!(
            "Targets: {}",
            targets
                .iter()
                .map(|t| format!("{t:?}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let reader = NpyReader;
    let resolver = CatalogResolver::new(&registry, &reader);
    let ids = if ids.is_empty() { None } else { Some(ids.as_slice()) };
    let batch = resolver.load_many(&data_dir, ids, &targets)?;

    match format {
        OutputFormat::Text => print_text(&batch),
        OutputFormat::Json => print_json(&batch)?,
        OutputFormat::Tsv => print_tsv(&batch),
    }

    if args.strict && !batch.is_complete() {
        anyhow::bail!(
            "{} of {} datasets failed to load",
            batch.failures.len(),
            batch.failures.len() + batch.bundles.len()
        );
    }

    Ok(())
}

fn print_text(batch: &BatchLoad) {
    println!(
        "Loaded {} datasets ({} failed)\n",
        batch.bundles.len(),
        batch.failures.len()
    );

    for bundle in batch.bundles.values() {
        let summary = BundleSummary::from(bundle);
        println!("{}  extent {:?}", summary.id, summary.extent);
        for (plane, plane_summary) in &summary.planes {
            println!(
                "  {:<14} {:<8} nonzero {}",
                plane.to_string(),
                plane_summary.element.to_string(),
                plane_summary.nonzero
            );
        }
    }

    if !batch.failures.is_empty() {
        println!("\nFailures:");
        for (id, failure) in &batch.failures {
            println!("  {id}: {failure}");
        }
    }
}

fn print_json(batch: &BatchLoad) -> anyhow::Result<()> {
    let bundles: Vec<BundleSummary> = batch.bundles.values().map(BundleSummary::from).collect();
    let failures: Vec<_> = batch
        .failures
        .iter()
        .map(|(id, failure)| {
            serde_json::json!({
                "id": id,
                "error": failure.to_string(),
            })
        })
        .collect();

    let output = serde_json::json!({
        "bundles": bundles,
        "failures": failures,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(batch: &BatchLoad) {
    println!("id\tplane\telement\textent\tnonzero");
    for bundle in batch.bundles.values() {
        let summary = BundleSummary::from(bundle);
        let extent = summary
            .extent
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("x");
        for (plane, plane_summary) in &summary.planes {
            println!(
                "{}\t{plane}\t{}\t{extent}\t{}",
                summary.id, plane_summary.element, plane_summary.nonzero
            );
        }
    }
}
