//! Multi-channel dataset assembly.
//!
//! - [`ChannelLoader`]: reads one channel and casts it to its working type
//! - [`DatasetAssembler`]: builds a bundle for one catalog entry
//! - [`CatalogResolver`]: resolves identifiers across catalogs and assembles
//!   them in parallel
//!
//! ## Assembly order
//!
//! 1. Identifiers ending in `a` read imagery from the directory without it
//! 2. Image, rescaled to [0, 1]
//! 3. Mask, or train/val masks for the pre-split dataset
//! 4. Segmentation, only for affinity or long-range targets
//! 5. Myelin and blood vessel when requested, zero-filled if not declared
//! 6. Fold exclusion on every mask plane
//!
//! ## Example
//!
//! ```rust,no_run
//! use em_dataprep::{CatalogRegistry, CatalogResolver, NpyReader};
//! use em_dataprep::core::types::{Target, TargetSet};
//! use std::path::Path;
//!
//! let registry = CatalogRegistry::load_embedded().unwrap();
//! let resolver = CatalogResolver::new(&registry, &NpyReader);
//! let targets = TargetSet::new().with(Target::Affinity).with(Target::Myelin);
//!
//! let batch = resolver.load_many(Path::new("/data"), None, &targets).unwrap();
//! for (id, bundle) in &batch.bundles {
//!     println!("{id}: {:?}", bundle.extent());
//! }
//! ```

pub mod assembler;
pub mod channel;
pub mod resolver;

pub use assembler::{AssembleError, DatasetAssembler};
pub use channel::ChannelLoader;
pub use resolver::{BatchLoad, CatalogResolver, LoadFailure};
