use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::core::types::{ChannelKind, DatasetId};
use crate::utils::validation::{validate_path_component, ValidationError};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Dataset '{id}' in catalog '{catalog}' is missing required channel '{channel}'")]
    MissingChannel {
        catalog: String,
        id: DatasetId,
        channel: ChannelKind,
    },

    #[error("Dataset '{id}' appears in both catalog '{first}' and catalog '{second}'")]
    DuplicateIdentifier {
        id: DatasetId,
        first: String,
        second: String,
    },

    #[error("Invalid path component in catalog '{catalog}': {source}")]
    InvalidPath {
        catalog: String,
        #[source]
        source: ValidationError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Dataset '{0}' not found in any catalog")]
    NotFound(DatasetId),
}

/// Catalog version for compatibility checking
pub const CATALOG_VERSION: &str = "1.0.0";

/// One dataset record: where each channel lives on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    /// Unique identifier within the registry
    pub id: DatasetId,

    /// File name per declared channel
    pub files: BTreeMap<ChannelKind, String>,

    /// Whether the dataset has a known location in the source volume
    #[serde(rename = "loc")]
    pub has_location: bool,
}

impl DatasetEntry {
    pub fn new(id: impl Into<String>, has_location: bool) -> Self {
        Self {
            id: DatasetId::new(id),
            files: BTreeMap::new(),
            has_location,
        }
    }

    #[must_use]
    pub fn with_file(mut self, channel: ChannelKind, file: impl Into<String>) -> Self {
        self.files.insert(channel, file.into());
        self
    }

    /// File declared for a channel, if any
    #[must_use]
    pub fn file(&self, channel: ChannelKind) -> Option<&str> {
        self.files.get(&channel).map(String::as_str)
    }

    #[must_use]
    pub fn declares(&self, channel: ChannelKind) -> bool {
        self.files.contains_key(&channel)
    }
}

/// Serializable form of one catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    pub name: String,
    pub subdir: String,
    pub datasets: Vec<DatasetEntry>,
}

/// Serializable registry format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryData {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub catalogs: Vec<CatalogData>,
}

/// A collection of datasets sharing one directory under the data root
#[derive(Debug, Clone)]
pub struct DatasetCatalog {
    /// Collection name (e.g. "minnie")
    pub name: String,

    /// Subdirectory of the data root holding the collection
    pub subdir: String,

    entries: Vec<DatasetEntry>,

    /// Index: dataset ID -> index in entries vec
    id_to_index: HashMap<DatasetId, usize>,
}

impl DatasetCatalog {
    /// Build a catalog, validating every entry.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::MissingChannel` if an entry lacks the image or
    /// mask channel, `CatalogError::InvalidPath` if an identifier or file name
    /// is not a plain path component, and `CatalogError::DuplicateIdentifier`
    /// if an identifier repeats within the catalog.
    pub fn new(
        name: impl Into<String>,
        subdir: impl Into<String>,
        entries: Vec<DatasetEntry>,
    ) -> Result<Self, CatalogError> {
        let name = name.into();
        let mut id_to_index = HashMap::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            validate_entry(&name, entry)?;
            if id_to_index.insert(entry.id.clone(), index).is_some() {
                return Err(CatalogError::DuplicateIdentifier {
                    id: entry.id.clone(),
                    first: name.clone(),
                    second: name,
                });
            }
        }

        Ok(Self {
            name,
            subdir: subdir.into(),
            entries,
            id_to_index,
        })
    }

    /// Get an entry by ID
    pub fn get(&self, id: &DatasetId) -> Option<&DatasetEntry> {
        self.id_to_index.get(id).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, id: &DatasetId) -> bool {
        self.id_to_index.contains_key(id)
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    /// Collection directory under a data root
    pub fn root(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.subdir)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn to_data(&self) -> CatalogData {
        CatalogData {
            name: self.name.clone(),
            subdir: self.subdir.clone(),
            datasets: self.entries.clone(),
        }
    }
}

fn validate_entry(catalog: &str, entry: &DatasetEntry) -> Result<(), CatalogError> {
    let invalid = |source| CatalogError::InvalidPath {
        catalog: catalog.to_string(),
        source,
    };

    validate_path_component(entry.id.as_str()).map_err(invalid)?;
    for file in entry.files.values() {
        validate_path_component(file).map_err(invalid)?;
    }

    for channel in ChannelKind::ALL {
        if channel.policy().required && !entry.declares(channel) {
            return Err(CatalogError::MissingChannel {
                catalog: catalog.to_string(),
                id: entry.id.clone(),
                channel,
            });
        }
    }
    Ok(())
}

/// A dataset entry together with the catalog that owns it
#[derive(Debug, Clone, Copy)]
pub struct CatalogHit<'a> {
    pub catalog: &'a DatasetCatalog,
    pub entry: &'a DatasetEntry,
}

/// All catalogs, searched in order.
///
/// Identifiers are unique across the whole registry, so a lookup resolves to
/// at most one catalog.
#[derive(Debug, Default)]
pub struct CatalogRegistry {
    catalogs: Vec<DatasetCatalog>,

    /// Index: dataset ID -> index in catalogs vec
    owner: HashMap<DatasetId, usize>,
}

impl CatalogRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the embedded default registry
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded JSON is invalid.
    pub fn load_embedded() -> Result<Self, CatalogError> {
        // Embedded at compile time via build.rs
        const EMBEDDED_CATALOG: &str = include_str!("../../catalogs/em_datasets.json");
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Load a registry from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid registry.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a registry from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or any catalog fails validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: RegistryData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != CATALOG_VERSION {
            warn!(
                expected = CATALOG_VERSION,
                found = %data.version,
                "Catalog version mismatch"
            );
        }

        let mut registry = Self::new();
        for catalog in data.catalogs {
            registry.add_catalog(DatasetCatalog::new(
                catalog.name,
                catalog.subdir,
                catalog.datasets,
            )?)?;
        }

        Ok(registry)
    }

    /// Add a catalog to the registry
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateIdentifier` if any of its identifiers is
    /// already owned by another catalog.
    pub fn add_catalog(&mut self, catalog: DatasetCatalog) -> Result<(), CatalogError> {
        for entry in catalog.entries() {
            if let Some(&existing) = self.owner.get(&entry.id) {
                return Err(CatalogError::DuplicateIdentifier {
                    id: entry.id.clone(),
                    first: self.catalogs[existing].name.clone(),
                    second: catalog.name.clone(),
                });
            }
        }

        let index = self.catalogs.len();
        for entry in catalog.entries() {
            self.owner.insert(entry.id.clone(), index);
        }
        self.catalogs.push(catalog);
        Ok(())
    }

    /// Find the catalog and entry for an identifier
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NotFound` if no catalog holds the identifier.
    pub fn lookup(&self, id: &DatasetId) -> Result<CatalogHit<'_>, LookupError> {
        let catalog = self
            .owner
            .get(id)
            .map(|&idx| &self.catalogs[idx])
            .ok_or_else(|| LookupError::NotFound(id.clone()))?;

        let entry = catalog
            .get(id)
            .ok_or_else(|| LookupError::NotFound(id.clone()))?;

        Ok(CatalogHit { catalog, entry })
    }

    /// Get an entry by ID
    pub fn get(&self, id: &DatasetId) -> Option<&DatasetEntry> {
        self.lookup(id).ok().map(|hit| hit.entry)
    }

    /// Catalog by name
    pub fn catalog(&self, name: &str) -> Option<&DatasetCatalog> {
        self.catalogs.iter().find(|c| c.name == name)
    }

    pub fn catalogs(&self) -> &[DatasetCatalog] {
        &self.catalogs
    }

    /// Every identifier, catalog by catalog in declaration order
    pub fn ids(&self) -> Vec<DatasetId> {
        self.catalogs
            .iter()
            .flat_map(|c| c.entries().iter().map(|e| e.id.clone()))
            .collect()
    }

    /// Export registry to JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let data = RegistryData {
            version: CATALOG_VERSION.to_string(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            catalogs: self.catalogs.iter().map(DatasetCatalog::to_data).collect(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Number of datasets across all catalogs
    pub fn len(&self) -> usize {
        self.owner.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.owner.is_empty()
    }
}
