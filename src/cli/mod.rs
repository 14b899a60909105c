//! Command-line interface for em-dataprep.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **catalog**: List, show, or export the dataset catalogs
//! - **load**: Assemble datasets from a data root and report what was loaded
//! - **geometry**: Resolve tensor shapes and scan stride for a model
//!
//! ## Usage
//!
//! ```text
//! # List every dataset in the embedded catalogs
//! em-dataprep catalog list
//!
//! # Assemble two datasets for affinity + myelin training
//! em-dataprep load --data-dir ~/data --data-names vol101 minnie001 --targets aff,mye
//!
//! # Shapes and stride for an affinity model with 4-voxel overlap
//! em-dataprep geometry --aff 3 --overlap 4 4 4 --format json
//! ```

use clap::{Parser, Subcommand};

pub mod catalog;
pub mod geometry;
pub mod load;

#[derive(Parser)]
#[command(name = "em-dataprep")]
#[command(version)]
#[command(about = "Assemble EM training volumes and resolve tiled-inference geometry")]
#[command(
    long_about = "em-dataprep prepares volumetric electron-microscopy data for a 3-D image-to-image model.\n\nIt provides:\n- Multi-channel dataset assembly (image, mask, segmentation, myelin, blood vessel) with fold exclusion\n- Input/output tensor shapes per task for training and scanning\n- Scan stride from fractional or voxel overlap"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect the dataset catalogs
    Catalog(catalog::CatalogArgs),

    /// Assemble datasets from disk
    Load(load::LoadArgs),

    /// Resolve tensor geometry and scan stride
    Geometry(geometry::GeometryArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Load the embedded registry, or a custom one from `path`
pub(crate) fn load_registry(
    path: Option<&std::path::Path>,
) -> anyhow::Result<crate::catalog::store::CatalogRegistry> {
    use crate::catalog::store::CatalogRegistry;

    Ok(match path {
        Some(path) => CatalogRegistry::load_from_file(path)?,
        None => CatalogRegistry::load_embedded()?,
    })
}
