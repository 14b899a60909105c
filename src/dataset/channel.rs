use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::types::ElementKind;
use crate::core::volume::Volume;
use crate::io::{ReadError, VolumeReader};

/// Reads single channels through a [`VolumeReader`] and casts them to their
/// working element type
#[derive(Clone, Copy)]
pub struct ChannelLoader<'a> {
    reader: &'a dyn VolumeReader,
}

impl<'a> ChannelLoader<'a> {
    pub fn new(reader: &'a dyn VolumeReader) -> Self {
        Self { reader }
    }

    /// Load `<base>/<dataset>/<file>` as `element`.
    ///
    /// `ElementKind::F32` is rescaled to the unit interval.
    ///
    /// # Errors
    ///
    /// Returns a `ReadError` if the file is missing or cannot be decoded.
    pub fn load(
        &self,
        base: &Path,
        dataset: &str,
        file: &str,
        element: ElementKind,
    ) -> Result<Volume, ReadError> {
        let path = channel_path(base, dataset, file);
        info!(path = %path.display(), %element, "Loading channel");

        let raw = self.reader.read(&path)?;
        Ok(raw.cast(element))
    }
}

/// `<base>/<dataset>/<file>`
#[must_use]
pub fn channel_path(base: &Path, dataset: &str, file: &str) -> PathBuf {
    base.join(dataset).join(file)
}
