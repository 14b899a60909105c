use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::store::{CatalogRegistry, LookupError};
use crate::core::bundle::DatasetBundle;
use crate::core::types::{DatasetId, TargetSet};
use crate::dataset::assembler::{AssembleError, DatasetAssembler};
use crate::io::VolumeReader;

/// Why a single identifier did not produce a bundle
#[derive(Error, Debug)]
pub enum LoadFailure {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

/// Result of loading a batch of identifiers
#[derive(Debug, Default)]
pub struct BatchLoad {
    /// Successfully assembled bundles
    pub bundles: BTreeMap<DatasetId, DatasetBundle>,

    /// Identifiers that failed, with the reason
    pub failures: BTreeMap<DatasetId, LoadFailure>,
}

impl BatchLoad {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Identifiers not present in any catalog
    pub fn not_found(&self) -> impl Iterator<Item = &DatasetId> + '_ {
        self.failures
            .iter()
            .filter(|(_, failure)| matches!(failure, LoadFailure::Lookup(_)))
            .map(|(id, _)| id)
    }
}

/// Maps dataset identifiers to their catalogs and assembles them
pub struct CatalogResolver<'a> {
    registry: &'a CatalogRegistry,
    assembler: DatasetAssembler<'a>,
}

impl<'a> CatalogResolver<'a> {
    pub fn new(registry: &'a CatalogRegistry, reader: &'a dyn VolumeReader) -> Self {
        Self {
            registry,
            assembler: DatasetAssembler::new(reader),
        }
    }

    /// Assemble a single identifier from whichever catalog owns it
    ///
    /// # Errors
    ///
    /// Returns `LoadFailure::Lookup` if no catalog holds the identifier, or
    /// `LoadFailure::Assemble` if assembly fails.
    pub fn load(
        &self,
        data_dir: &Path,
        id: &DatasetId,
        targets: &TargetSet,
    ) -> Result<DatasetBundle, LoadFailure> {
        let hit = self.registry.lookup(id)?;
        let base = hit.catalog.root(data_dir);
        Ok(self.assembler.assemble(&base, id, hit.entry, targets)?)
    }

    /// Assemble many identifiers in parallel.
    ///
    /// With `ids` of `None`, every identifier of every catalog is loaded.
    /// Repeated identifiers are loaded once. Failures are collected per
    /// identifier and do not stop the rest of the batch.
    ///
    /// # Errors
    ///
    /// Returns `AssembleError::NoTargets` before any I/O if `targets` is empty.
    pub fn load_many(
        &self,
        data_dir: &Path,
        ids: Option<&[DatasetId]>,
        targets: &TargetSet,
    ) -> Result<BatchLoad, AssembleError> {
        if targets.is_empty() {
            return Err(AssembleError::NoTargets);
        }

        let ids = match ids {
            Some(ids) => dedup(ids),
            None => self.registry.ids(),
        };
        info!(datasets = ids.len(), data_dir = %data_dir.display(), "Loading datasets");

        let results: Vec<_> = ids
            .par_iter()
            .map(|id| (id.clone(), self.load(data_dir, id, targets)))
            .collect();

        let mut batch = BatchLoad::default();
        for (id, result) in results {
            match result {
                Ok(bundle) => {
                    batch.bundles.insert(id, bundle);
                }
                Err(failure) => {
                    warn!(dataset = %id, error = %failure, "Dataset not loaded");
                    batch.failures.insert(id, failure);
                }
            }
        }

        Ok(batch)
    }
}

fn dedup(ids: &[DatasetId]) -> Vec<DatasetId> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}
