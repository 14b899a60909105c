use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique identifier for a dataset in the catalog
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DatasetId(pub String);

impl DatasetId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named data plane stored on disk for a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    #[serde(rename = "img")]
    Image,
    #[serde(rename = "seg")]
    Segmentation,
    #[serde(rename = "msk")]
    Mask,
    #[serde(rename = "mye")]
    Myelin,
    #[serde(rename = "blv")]
    BloodVessel,
    #[serde(rename = "fld")]
    Fold,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 6] = [
        Self::Image,
        Self::Segmentation,
        Self::Mask,
        Self::Myelin,
        Self::BloodVessel,
        Self::Fold,
    ];

    /// Short key used in catalog files
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Image => "img",
            Self::Segmentation => "seg",
            Self::Mask => "msk",
            Self::Myelin => "mye",
            Self::BloodVessel => "blv",
            Self::Fold => "fld",
        }
    }

    /// Loading policy for this channel
    #[must_use]
    pub fn policy(self) -> ChannelPolicy {
        match self {
            Self::Image => ChannelPolicy::new(true, ElementKind::F32, false),
            Self::Segmentation => ChannelPolicy::new(false, ElementKind::U32, false),
            Self::Mask => ChannelPolicy::new(true, ElementKind::U8, false),
            Self::Myelin | Self::BloodVessel => ChannelPolicy::new(false, ElementKind::U8, true),
            Self::Fold => ChannelPolicy::new(false, ElementKind::U8, false),
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Segmentation => write!(f, "segmentation"),
            Self::Mask => write!(f, "mask"),
            Self::Myelin => write!(f, "myelin"),
            Self::BloodVessel => write!(f, "blood-vessel"),
            Self::Fold => write!(f, "fold"),
        }
    }
}

/// In-memory element type of a loaded channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// 32-bit float, rescaled to the unit interval
    F32,
    U8,
    U32,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::F32 => write!(f, "float32"),
            Self::U8 => write!(f, "uint8"),
            Self::U32 => write!(f, "uint32"),
        }
    }
}

/// How a channel is treated by the assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPolicy {
    /// Every catalog entry must declare a file for this channel
    pub required: bool,

    /// Element type after loading
    pub element: ElementKind,

    /// Substitute a zero-filled volume when requested but not declared
    pub zero_fill_if_absent: bool,
}

impl ChannelPolicy {
    const fn new(required: bool, element: ElementKind, zero_fill_if_absent: bool) -> Self {
        Self {
            required,
            element,
            zero_fill_if_absent,
        }
    }
}

/// A training target requested from the assembler
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Target {
    #[serde(rename = "img")]
    #[value(name = "img")]
    Image,
    #[serde(rename = "msk")]
    #[value(name = "msk")]
    Mask,
    /// Nearest-neighbour affinity, needs segmentation
    #[serde(rename = "aff")]
    #[value(name = "aff")]
    Affinity,
    /// Long-range affinity, needs segmentation
    #[serde(rename = "long")]
    #[value(name = "long")]
    LongRange,
    #[serde(rename = "mye")]
    #[value(name = "mye")]
    Myelin,
    #[serde(rename = "blv")]
    #[value(name = "blv")]
    BloodVessel,
}

/// Non-ordered set of requested targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSet(BTreeSet<Target>);

impl TargetSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, target: Target) -> Self {
        self.0.insert(target);
        self
    }

    #[must_use]
    pub fn contains(&self, target: Target) -> bool {
        self.0.contains(&target)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Segmentation is only worth loading for affinity-style targets
    #[must_use]
    pub fn needs_segmentation(&self) -> bool {
        self.contains(Target::Affinity) || self.contains(Target::LongRange)
    }

    pub fn iter(&self) -> impl Iterator<Item = Target> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Target> for TargetSet {
    fn from_iter<I: IntoIterator<Item = Target>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_policy_table() {
        assert!(ChannelKind::Image.policy().required);
        assert!(ChannelKind::Mask.policy().required);
        assert_eq!(ChannelKind::Image.policy().element, ElementKind::F32);
        assert_eq!(ChannelKind::Segmentation.policy().element, ElementKind::U32);

        for kind in [ChannelKind::Myelin, ChannelKind::BloodVessel] {
            let policy = kind.policy();
            assert!(!policy.required);
            assert!(policy.zero_fill_if_absent);
            assert_eq!(policy.element, ElementKind::U8);
        }
        assert!(!ChannelKind::Fold.policy().zero_fill_if_absent);
    }

    #[test]
    fn test_channel_kind_serde_keys() {
        for kind in ChannelKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.key()));
        }
    }

    #[test]
    fn test_needs_segmentation() {
        let basic: TargetSet = [Target::Image, Target::Mask].into_iter().collect();
        assert!(!basic.needs_segmentation());

        assert!(basic.clone().with(Target::Affinity).needs_segmentation());
        assert!(basic.with(Target::LongRange).needs_segmentation());
    }
}
