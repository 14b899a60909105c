//! Dataset catalog storage and lookup.
//!
//! A catalog lists the datasets of one imaging collection together with the
//! file backing each channel. The registry holds every catalog and resolves
//! an identifier to the catalog that owns it. A default registry is compiled
//! into the binary; custom registries can be loaded from JSON files.
//!
//! ## Embedded Registry
//!
//! - **minnie**: `minnie/ground_truth/mip1/padded_x512_y512_z0`
//! - **basil**: `basil/ground_truth/mip1/padded_x512_y512_z32`
//! - **pinky**: `pinky/ground_truth/mip1/padded_x512_y512_z32`
//!
//! ## Example
//!
//! ```rust,no_run
//! use em_dataprep::CatalogRegistry;
//! use em_dataprep::core::types::DatasetId;
//!
//! let registry = CatalogRegistry::load_embedded().unwrap();
//!
//! for catalog in registry.catalogs() {
//!     println!("{}: {} datasets", catalog.name, catalog.len());
//! }
//!
//! let hit = registry.lookup(&DatasetId::new("vol101")).unwrap();
//! println!("{} lives in {}", hit.entry.id, hit.catalog.subdir);
//! ```
//!
//! Identifiers are unique across the registry: loading a registry in which
//! two catalogs declare the same identifier fails.

pub mod store;
