use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{ChannelKind, DatasetId, ElementKind};
use crate::core::volume::Volume;

/// Key of an array inside an assembled bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Plane {
    #[serde(rename = "img")]
    Image,
    #[serde(rename = "seg")]
    Segmentation,
    #[serde(rename = "msk")]
    Mask,
    #[serde(rename = "msk_train")]
    TrainMask,
    #[serde(rename = "msk_val")]
    ValMask,
    #[serde(rename = "mye")]
    Myelin,
    #[serde(rename = "blv")]
    BloodVessel,
}

impl Plane {
    /// Planes that carry loss validity and are subject to fold exclusion
    pub const MASKS: [Plane; 3] = [Self::Mask, Self::TrainMask, Self::ValMask];

    #[must_use]
    pub fn is_mask(self) -> bool {
        Self::MASKS.contains(&self)
    }

    /// Channel kind the plane is read from
    #[must_use]
    pub fn channel(self) -> ChannelKind {
        match self {
            Self::Image => ChannelKind::Image,
            Self::Segmentation => ChannelKind::Segmentation,
            Self::Mask | Self::TrainMask | Self::ValMask => ChannelKind::Mask,
            Self::Myelin => ChannelKind::Myelin,
            Self::BloodVessel => ChannelKind::BloodVessel,
        }
    }

    #[must_use]
    pub fn element(self) -> ElementKind {
        self.channel().policy().element
    }
}

impl std::fmt::Display for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrainMask => write!(f, "train-mask"),
            Self::ValMask => write!(f, "val-mask"),
            other => write!(f, "{}", other.channel()),
        }
    }
}

/// All arrays assembled for one dataset identifier.
///
/// Every plane shares the spatial extent of the image, and every mask plane
/// has had fold regions zeroed.
#[derive(Debug, Clone)]
pub struct DatasetBundle {
    /// Identifier the bundle was requested under
    pub id: DatasetId,

    /// Loaded planes
    pub planes: BTreeMap<Plane, Volume>,

    /// Whether the dataset has a known location in the source volume
    pub has_location: bool,
}

impl DatasetBundle {
    #[must_use]
    pub fn new(id: DatasetId, image: Volume, has_location: bool) -> Self {
        let mut planes = BTreeMap::new();
        planes.insert(Plane::Image, image);
        Self {
            id,
            planes,
            has_location,
        }
    }

    #[must_use]
    pub fn get(&self, plane: Plane) -> Option<&Volume> {
        self.planes.get(&plane)
    }

    #[must_use]
    pub fn contains(&self, plane: Plane) -> bool {
        self.planes.contains_key(&plane)
    }

    /// The image plane is always present
    #[must_use]
    pub fn image(&self) -> &Volume {
        &self.planes[&Plane::Image]
    }

    /// Spatial extent shared by every plane
    #[must_use]
    pub fn extent(&self) -> &[usize] {
        self.image().shape()
    }

    pub fn keys(&self) -> impl Iterator<Item = Plane> + '_ {
        self.planes.keys().copied()
    }

    pub(crate) fn insert(&mut self, plane: Plane, volume: Volume) {
        self.planes.insert(plane, volume);
    }

    pub(crate) fn masks_mut(&mut self) -> impl Iterator<Item = (Plane, &mut Volume)> + '_ {
        self.planes
            .iter_mut()
            .filter(|(plane, _)| plane.is_mask())
            .map(|(plane, volume)| (*plane, volume))
    }
}

/// Serializable summary of a bundle, for reporting
#[derive(Debug, Clone, Serialize)]
pub struct BundleSummary {
    pub id: DatasetId,
    pub extent: Vec<usize>,
    pub has_location: bool,
    pub planes: BTreeMap<Plane, PlaneSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaneSummary {
    pub element: ElementKind,
    pub nonzero: usize,
}

impl From<&DatasetBundle> for BundleSummary {
    fn from(bundle: &DatasetBundle) -> Self {
        Self {
            id: bundle.id.clone(),
            extent: bundle.extent().to_vec(),
            has_location: bundle.has_location,
            planes: bundle
                .planes
                .iter()
                .map(|(plane, volume)| {
                    (
                        *plane,
                        PlaneSummary {
                            element: volume.element(),
                            nonzero: volume.count_nonzero(),
                        },
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_channels() {
        assert_eq!(Plane::TrainMask.channel(), ChannelKind::Mask);
        assert_eq!(Plane::ValMask.element(), ElementKind::U8);
        assert_eq!(Plane::Image.element(), ElementKind::F32);
        assert!(Plane::ValMask.is_mask());
        assert!(!Plane::Myelin.is_mask());
    }

    #[test]
    fn test_plane_display() {
        assert_eq!(Plane::TrainMask.to_string(), "train-mask");
        assert_eq!(Plane::BloodVessel.to_string(), "blood-vessel");
    }

    #[test]
    fn test_summary() {
        let image = Volume::zeros(&[2, 4, 4], ElementKind::F32);
        let mut bundle = DatasetBundle::new(DatasetId::new("vol001"), image, true);
        bundle.insert(Plane::Mask, Volume::zeros(&[2, 4, 4], ElementKind::U8));

        let summary = BundleSummary::from(&bundle);
        assert_eq!(summary.extent, vec![2, 4, 4]);
        assert_eq!(summary.planes.len(), 2);
        assert!(summary.has_location);

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"msk\""));
    }
}
