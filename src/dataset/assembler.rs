use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::catalog::store::DatasetEntry;
use crate::core::bundle::{DatasetBundle, Plane};
use crate::core::types::{ChannelKind, DatasetId, Target, TargetSet};
use crate::core::volume::{exclude_folds, Volume};
use crate::dataset::channel::ChannelLoader;
use crate::io::{ReadError, VolumeReader};
use crate::utils::validation::{same_extent, validate_path_component, ValidationError};

/// Suffix marking an alternate annotation of the same imagery
pub const DUPLICATE_SUFFIX: char = 'a';

/// Dataset whose mask is split into training and validation partitions
pub const PRE_SPLIT_DATASET: &str = "stitched_vol19-vol34";

pub const TRAIN_MASK_FILE: &str = "msk_train.h5";
pub const VAL_MASK_FILE: &str = "msk_val.h5";

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("No targets requested")]
    NoTargets,

    #[error("Dataset '{id}' declares no {channel} file")]
    MissingChannel { id: DatasetId, channel: ChannelKind },

    #[error("Invalid dataset directory: {0}")]
    InvalidPath(#[from] ValidationError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("Dataset '{id}': {channel} extent {found:?} differs from image extent {expected:?}")]
    ShapeMismatch {
        id: DatasetId,
        channel: ChannelKind,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
}

/// Directory holding the imagery for an identifier.
///
/// Identifiers ending in [`DUPLICATE_SUFFIX`] share the directory of the
/// identifier without it.
#[must_use]
pub fn dataset_dir_name(id: &str) -> &str {
    id.strip_suffix(DUPLICATE_SUFFIX)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(id)
}

/// Builds a [`DatasetBundle`] from one catalog entry
#[derive(Clone, Copy)]
pub struct DatasetAssembler<'a> {
    loader: ChannelLoader<'a>,
}

impl<'a> DatasetAssembler<'a> {
    pub fn new(reader: &'a dyn VolumeReader) -> Self {
        Self {
            loader: ChannelLoader::new(reader),
        }
    }

    /// Load every plane `targets` calls for.
    ///
    /// The image and mask are always loaded. Segmentation is loaded only for
    /// affinity-style targets. Requested myelin or blood-vessel channels the
    /// entry does not declare are zero-filled. When the entry declares a fold
    /// channel, fold regions are zeroed in every mask plane.
    ///
    /// # Errors
    ///
    /// Returns `AssembleError::NoTargets` before any I/O if `targets` is empty,
    /// `AssembleError::Read` if a file cannot be read,
    /// `AssembleError::MissingChannel` if a needed channel is not declared, and
    /// `AssembleError::ShapeMismatch` if a plane's extent differs from the image.
    pub fn assemble(
        &self,
        base: &Path,
        id: &DatasetId,
        entry: &DatasetEntry,
        targets: &TargetSet,
    ) -> Result<DatasetBundle, AssembleError> {
        if targets.is_empty() {
            return Err(AssembleError::NoTargets);
        }

        let dir = validate_path_component(dataset_dir_name(id.as_str()))?;
        let declared = |channel| declared_file(id, entry, channel);
        let load = |file: &str, channel: ChannelKind| {
            self.loader.load(base, dir, file, channel.policy().element)
        };

        let image = load(declared(ChannelKind::Image)?, ChannelKind::Image)?;
        let extent = image.shape().to_vec();
        let check = |channel, volume: &Volume| check_extent(id, channel, &extent, volume);

        let mut bundle = DatasetBundle::new(id.clone(), image, entry.has_location);

        // Mask
        if dir == PRE_SPLIT_DATASET {
            for (plane, file) in [
                (Plane::TrainMask, TRAIN_MASK_FILE),
                (Plane::ValMask, VAL_MASK_FILE),
            ] {
                let mask = load(file, ChannelKind::Mask)?;
                check(ChannelKind::Mask, &mask)?;
                bundle.insert(plane, mask);
            }
        } else {
            let mask = load(declared(ChannelKind::Mask)?, ChannelKind::Mask)?;
            check(ChannelKind::Mask, &mask)?;
            bundle.insert(Plane::Mask, mask);
        }

        // Segmentation
        if targets.needs_segmentation() {
            let seg = load(declared(ChannelKind::Segmentation)?, ChannelKind::Segmentation)?;
            check(ChannelKind::Segmentation, &seg)?;
            bundle.insert(Plane::Segmentation, seg);
        }

        // Myelin and blood vessel
        for (target, plane) in [
            (Target::Myelin, Plane::Myelin),
            (Target::BloodVessel, Plane::BloodVessel),
        ] {
            if !targets.contains(target) {
                continue;
            }
            let channel = plane.channel();
            let policy = channel.policy();
            let volume = match entry.file(channel) {
                Some(file) => {
                    let volume = load(file, channel)?;
                    check(channel, &volume)?;
                    volume
                }
                None if policy.zero_fill_if_absent => {
                    debug!(dataset = %id, %channel, "No annotation declared, zero-filling");
                    Volume::zeros(&extent, policy.element)
                }
                None => {
                    return Err(AssembleError::MissingChannel {
                        id: id.clone(),
                        channel,
                    })
                }
            };
            bundle.insert(plane, volume);
        }

        // Fold
        if let Some(file) = entry.file(ChannelKind::Fold) {
            let fold = load(file, ChannelKind::Fold)?;
            fuse_folds(&mut bundle, &fold)?;
        }

        Ok(bundle)
    }
}

/// Zero every mask plane of `bundle` wherever `fold` is positive.
///
/// Applying the same fold twice leaves the masks as after the first pass.
///
/// # Errors
///
/// Returns `AssembleError::ShapeMismatch` if `fold` does not match the
/// bundle's extent.
pub fn fuse_folds(bundle: &mut DatasetBundle, fold: &Volume) -> Result<(), AssembleError> {
    let extent = bundle.extent().to_vec();
    check_extent(&bundle.id, ChannelKind::Fold, &extent, fold)?;

    let fold = match fold {
        Volume::U8(data) => data.clone(),
        Volume::U32(data) => data.mapv(|v| u8::from(v > 0)),
        Volume::F32(data) => data.mapv(|v| u8::from(v > 0.0)),
    };

    for (plane, mask) in bundle.masks_mut() {
        if let Some(mask) = mask.as_u8_mut() {
            exclude_folds(mask, &fold);
        } else {
            debug!(%plane, "Skipping fold exclusion on non-u8 mask");
        }
    }
    Ok(())
}

fn check_extent(
    id: &DatasetId,
    channel: ChannelKind,
    expected: &[usize],
    volume: &Volume,
) -> Result<(), AssembleError> {
    if same_extent(expected, volume.shape()) {
        Ok(())
    } else {
        Err(AssembleError::ShapeMismatch {
            id: id.clone(),
            channel,
            expected: expected.to_vec(),
            found: volume.shape().to_vec(),
        })
    }
}

fn declared_file<'e>(
    id: &DatasetId,
    entry: &'e DatasetEntry,
    channel: ChannelKind,
) -> Result<&'e str, AssembleError> {
    entry
        .file(channel)
        .ok_or_else(|| AssembleError::MissingChannel {
            id: id.clone(),
            channel,
        })
}
