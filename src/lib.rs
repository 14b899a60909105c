//! # em-dataprep
//!
//! A library for preparing volumetric electron-microscopy data for a 3-D
//! image-to-image model.
//!
//! Training data comes from several imaging collections, each with its own
//! directory layout and its own set of annotated channels. Some volumes have
//! myelin or blood-vessel labels, some have fold annotations, one is already
//! split into training and validation regions. `em-dataprep` resolves dataset
//! names against a catalog of these collections and assembles every requested
//! channel into one bundle per dataset, in the element type the model expects.
//!
//! ## Features
//!
//! - **Catalog lookup**: One registry over all collections, with unique identifiers
//! - **Typed channels**: Image rescaled to `[0, 1]`, masks as `u8`, segmentation as `u32`
//! - **Zero-fill**: Myelin and blood-vessel channels default to empty volumes
//! - **Fold exclusion**: Folded voxels are removed from every validity mask
//! - **Shape checks**: Every plane must match the image extent
//! - **Scan geometry**: Tensor shapes per task and stride from the requested overlap
//!
//! ## Example
//!
//! ```rust,no_run
//! use em_dataprep::{CatalogRegistry, CatalogResolver, GeometryConfig, NpyReader};
//! use em_dataprep::core::geometry::TaskSpec;
//! use em_dataprep::core::types::{DatasetId, Target, TargetSet};
//! use std::path::Path;
//!
//! // Load the embedded catalog of known datasets
//! let registry = CatalogRegistry::load_embedded().unwrap();
//!
//! // Assemble two volumes for affinity training
//! let resolver = CatalogResolver::new(&registry, &NpyReader);
//! let targets = TargetSet::new().with(Target::Affinity);
//! let ids = [DatasetId::new("vol101"), DatasetId::new("minnie001")];
//! let batch = resolver.load_many(Path::new("/data"), Some(&ids), &targets).unwrap();
//!
//! // Shapes and stride for a 3-channel affinity model
//! let tasks = TaskSpec { affinity: 3, ..TaskSpec::default() };
//! let geometry = GeometryConfig::default().with_tasks(tasks).resolve().unwrap();
//! println!("{} bundles, stride {:?}", batch.bundles.len(), geometry.scan_params.stride);
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Dataset catalog storage and lookup
//! - [`core`]: Core data types for channels, volumes, bundles, and geometry
//! - [`dataset`]: Channel loading and multi-channel assembly
//! - [`io`]: Volumetric array readers
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod dataset;
pub mod io;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::store::{CatalogRegistry, DatasetCatalog, DatasetEntry};
pub use core::bundle::DatasetBundle;
pub use core::geometry::{GeometryConfig, GeometrySpec};
pub use core::types::*;
pub use dataset::{BatchLoad, CatalogResolver, DatasetAssembler};
pub use io::{NpyReader, VolumeReader};
