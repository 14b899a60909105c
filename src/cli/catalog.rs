use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::catalog::store::{CatalogRegistry, DatasetCatalog, DatasetEntry};
use crate::cli::{load_registry, OutputFormat};
use crate::core::types::{ChannelKind, DatasetId};

#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommands,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List all datasets in the catalogs
    List {
        /// Path to custom catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Only list datasets of this collection (e.g., "pinky")
        #[arg(long)]
        collection: Option<String>,
    },

    /// Show details of a specific dataset
    Show {
        /// Dataset ID
        #[arg(required = true)]
        id: String,

        /// Path to custom catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Export the catalogs to a file
    Export {
        /// Output file path
        #[arg(required = true)]
        output: PathBuf,

        /// Path to custom catalog file to export (defaults to embedded)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

/// Execute catalog subcommand
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, the dataset or collection
/// is unknown, or the export cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CatalogArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        CatalogCommands::List {
            catalog,
            collection,
        } => run_list(catalog, collection.as_deref(), format, verbose),
        CatalogCommands::Show { id, catalog } => run_show(&id, catalog, format),
        CatalogCommands::Export { output, catalog } => run_export(output, catalog),
    }
}

fn run_list(
    catalog_path: Option<PathBuf>,
    collection: Option<&str>,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let registry = load_registry(catalog_path.as_deref())?;

    if verbose {
        eprintln!(
            "Loaded {} catalogs with {} datasets",
            registry.catalogs().len(),
            registry.len()
        );
    }

    let catalogs: Vec<&DatasetCatalog> = match collection {
        Some(name) => vec![registry
            .catalog(name)
            .ok_or_else(|| anyhow::anyhow!("Collection '{name}' not found in catalog"))?],
        None => registry.catalogs().iter().collect(),
    };

    match format {
        OutputFormat::Text => print_text_list(&catalogs),
        OutputFormat::Json => {
            let output: Vec<_> = catalogs
                .iter()
                .flat_map(|c| c.entries().iter().map(move |e| entry_json(c, e)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("id\tcollection\tchannels\tloc");
            for catalog in &catalogs {
                for entry in catalog.entries() {
                    println!(
                        "{}\t{}\t{}\t{}",
                        entry.id,
                        catalog.name,
                        channel_keys(entry),
                        entry.has_location
                    );
                }
            }
        }
    }

    Ok(())
}

fn print_text_list(catalogs: &[&DatasetCatalog]) {
    let total: usize = catalogs.iter().map(|c| c.len()).sum();

    // Calculate column widths dynamically
    let id_width = catalogs
        .iter()
        .flat_map(|c| c.entries().iter().map(|e| e.id.0.len()))
        .max()
        .unwrap_or(2)
        .max(2);
    let collection_width = catalogs
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(10)
        .max(10);

    println!("Dataset Catalog ({total} datasets)\n");
    println!(
        "{:<id_w$} {:<col_w$} {:<24} {:>4}",
        "ID",
        "Collection",
        "Channels",
        "Loc",
        id_w = id_width,
        col_w = collection_width,
    );
    println!("{}", "-".repeat(id_width + collection_width + 24 + 4 + 3));

    for catalog in catalogs {
        for entry in catalog.entries() {
            println!(
                "{:<id_w$} {:<col_w$} {:<24} {:>4}",
                entry.id.0,
                catalog.name,
                channel_keys(entry),
                if entry.has_location { "yes" } else { "no" },
                id_w = id_width,
                col_w = collection_width,
            );
        }
    }
}

fn run_show(id: &str, catalog_path: Option<PathBuf>, format: OutputFormat) -> anyhow::Result<()> {
    let registry = load_registry(catalog_path.as_deref())?;
    let hit = registry.lookup(&DatasetId::new(id))?;

    match format {
        OutputFormat::Text => {
            println!("Dataset: {}", hit.entry.id);
            println!("Collection: {}", hit.catalog.name);
            println!("Directory: {}", hit.catalog.subdir);
            println!("Known location: {}", hit.entry.has_location);
            println!("\nChannels:");
            for channel in ChannelKind::ALL {
                match hit.entry.file(channel) {
                    Some(file) => println!("  {:<14} {file}", channel.to_string()),
                    None if channel.policy().zero_fill_if_absent => {
                        println!("  {:<14} (zero-filled if requested)", channel.to_string());
                    }
                    None => {}
                }
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&entry_json(hit.catalog, hit.entry))?
            );
        }
        OutputFormat::Tsv => {
            println!("channel\tfile");
            for (channel, file) in &hit.entry.files {
                println!("{}\t{file}", channel.key());
            }
        }
    }

    Ok(())
}

fn run_export(output: PathBuf, catalog_path: Option<PathBuf>) -> anyhow::Result<()> {
    let registry: CatalogRegistry = load_registry(catalog_path.as_deref())?;
    let json = registry.to_json()?;
    std::fs::write(&output, json)?;
    eprintln!(
        "Exported {} datasets to {}",
        registry.len(),
        output.display()
    );
    Ok(())
}

fn channel_keys(entry: &DatasetEntry) -> String {
    entry
        .files
        .keys()
        .map(|c| c.key())
        .collect::<Vec<_>>()
        .join(",")
}

fn entry_json(catalog: &DatasetCatalog, entry: &DatasetEntry) -> serde_json::Value {
    serde_json::json!({
        "id": entry.id,
        "collection": catalog.name,
        "subdir": catalog.subdir,
        "files": entry.files,
        "loc": entry.has_location,
    })
}
