//! Tensor geometry for training samples and tiled inference.
//!
//! Given a field of view, the requested tasks and an overlap specification,
//! [`GeometryConfig::resolve`] derives:
//!
//! - the input tensor shape (one channel),
//! - one output tensor shape per requested task, for training,
//! - the matching shapes produced during scanning,
//! - the scan stride and blending mode.
//!
//! ## Overlap
//!
//! Each overlap component is read one of two ways:
//!
//! | Overlap `o`       | Stride on that axis        |
//! |-------------------|----------------------------|
//! | `0 < o < 1`       | `1 - o` (fraction of the window) |
//! | `o <= 0`, `o >= 1`| `extent - o` voxels        |
//!
//! The bounds are exclusive, so `0` and `1` both select the voxel form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Default field of view (z, y, x)
pub const DEFAULT_FOV: [usize; 3] = [20, 256, 256];

/// Default fractional overlap
pub const DEFAULT_OVERLAP: [f64; 3] = [0.5, 0.5, 0.5];

/// Channel count of an affinity map at scan time
pub const SCAN_AFFINITY_CHANNELS: usize = 3;

#[derive(Error, Debug, PartialEq)]
pub enum GeometryError {
    #[error("No task selected: request an embedding, affinity, synapse or mitochondria output")]
    NoTasks,

    #[error("Field of view component {axis} must be positive")]
    EmptyFieldOfView { axis: usize },

    #[error("{name} component {axis} must be positive")]
    EmptyExtent { name: &'static str, axis: usize },

    #[error("Overlap component {axis} is not a finite number: {value}")]
    NonFiniteOverlap { axis: usize, value: f64 },

    #[error("Overlap {overlap} on axis {axis} leaves no room to advance over extent {extent}")]
    NonPositiveStride {
        axis: usize,
        extent: usize,
        overlap: f64,
    },
}

/// Output head of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Embedding,
    Affinity,
    Synapse,
    Mitochondria,
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedding => write!(f, "embedding"),
            Self::Affinity => write!(f, "affinity"),
            Self::Synapse => write!(f, "synapse"),
            Self::Mitochondria => write!(f, "mitochondria"),
        }
    }
}

/// Requested tasks and their channel counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Embedding dimensionality, 0 disables the embedding head
    pub embedding: usize,

    /// Convert embeddings to a 3-channel affinity map while scanning
    pub embedding_to_affinity: bool,

    /// Affinity channel count, 0 disables the affinity head
    pub affinity: usize,

    /// Binary synapse detection
    pub synapse: bool,

    /// Binary mitochondria detection
    pub mitochondria: bool,
}

impl TaskSpec {
    /// Channel count per task for training.
    ///
    /// An embedding head excludes every other head.
    #[must_use]
    pub fn training_channels(&self) -> BTreeMap<Task, usize> {
        self.channels(self.embedding, self.affinity)
    }

    /// Channel count per task as produced while scanning
    #[must_use]
    pub fn scan_channels(&self) -> BTreeMap<Task, usize> {
        let embedding = if self.embedding_to_affinity {
            SCAN_AFFINITY_CHANNELS
        } else {
            self.embedding
        };
        let affinity = if self.affinity > 0 {
            SCAN_AFFINITY_CHANNELS
        } else {
            0
        };
        self.channels(embedding, affinity)
    }

    fn channels(&self, embedding: usize, affinity: usize) -> BTreeMap<Task, usize> {
        let mut channels = BTreeMap::new();
        if self.embedding > 0 {
            channels.insert(Task::Embedding, embedding);
            return channels;
        }
        if affinity > 0 {
            channels.insert(Task::Affinity, affinity);
        }
        if self.synapse {
            channels.insert(Task::Synapse, 1);
        }
        if self.mitochondria {
            channels.insert(Task::Mitochondria, 1);
        }
        channels
    }
}

/// Blending of overlapping scan windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Blend {
    #[default]
    Bump,
    Precomputed,
}

impl std::fmt::Display for Blend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bump => write!(f, "bump"),
            Self::Precomputed => write!(f, "precomputed"),
        }
    }
}

/// Step between scan windows along one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrideAxis {
    /// Fraction of the window extent
    Fraction(f64),
    /// Absolute step in voxels
    Voxels(i64),
}

impl StrideAxis {
    /// Stride along one axis for window extent `extent` and overlap `overlap`
    #[must_use]
    pub fn from_overlap(extent: usize, overlap: f64) -> Self {
        if overlap > 0.0 && overlap < 1.0 {
            Self::Fraction(1.0 - overlap)
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            let step = (extent as f64 - overlap).trunc() as i64;
            Self::Voxels(step)
        }
    }

    fn is_positive(self) -> bool {
        match self {
            Self::Fraction(f) => f > 0.0,
            Self::Voxels(v) => v > 0,
        }
    }
}

impl std::fmt::Display for StrideAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fraction(v) => write!(f, "{v}"),
            Self::Voxels(v) => write!(f, "{v}"),
        }
    }
}

/// Channel count followed by spatial extent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorShape {
    pub channels: usize,
    pub extent: [usize; 3],
}

impl TensorShape {
    #[must_use]
    pub fn new(channels: usize, extent: [usize; 3]) -> Self {
        Self { channels, extent }
    }

    /// `[channels, z, y, x]`
    #[must_use]
    pub fn dims(&self) -> [usize; 4] {
        [
            self.channels,
            self.extent[0],
            self.extent[1],
            self.extent[2],
        ]
    }
}

impl std::fmt::Display for TensorShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [c, z, y, x] = self.dims();
        write!(f, "({c}, {z}, {y}, {x})")
    }
}

/// Parameters for tiled inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanParams {
    pub stride: [StrideAxis; 3],
    pub blend: Blend,
}

/// Inputs to geometry resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    pub fov: [usize; 3],

    /// Input extent, defaults to the field of view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_size: Option<[usize; 3]>,

    /// Output extent, defaults to the field of view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_size: Option<[usize; 3]>,

    pub tasks: TaskSpec,

    pub overlap: [f64; 3],

    #[serde(default)]
    pub blend: Blend,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            fov: DEFAULT_FOV,
            input_size: None,
            output_size: None,
            tasks: TaskSpec::default(),
            overlap: DEFAULT_OVERLAP,
            blend: Blend::default(),
        }
    }
}

/// Resolved tensor geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySpec {
    pub fov: [usize; 3],
    pub input: TensorShape,
    pub outputs: BTreeMap<Task, TensorShape>,
    pub scan_outputs: BTreeMap<Task, TensorShape>,
    pub scan_params: ScanParams,
}

impl GeometryConfig {
    #[must_use]
    pub fn with_tasks(mut self, tasks: TaskSpec) -> Self {
        self.tasks = tasks;
        self
    }

    #[must_use]
    pub fn with_overlap(mut self, overlap: [f64; 3]) -> Self {
        self.overlap = overlap;
        self
    }

    /// Derive input/output shapes and scan stride.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NoTasks` if no output head is requested, an
    /// extent error if any spatial component is zero, and an overlap error if
    /// an overlap is not finite or leaves a non-positive stride.
    pub fn resolve(&self) -> Result<GeometrySpec, GeometryError> {
        if let Some(axis) = self.fov.iter().position(|&f| f == 0) {
            return Err(GeometryError::EmptyFieldOfView { axis });
        }
        let input_size = self.input_size.unwrap_or(self.fov);
        let output_size = self.output_size.unwrap_or(self.fov);
        check_extent("Input size", &input_size)?;
        check_extent("Output size", &output_size)?;

        let outputs: BTreeMap<_, _> = self
            .tasks
            .training_channels()
            .into_iter()
            .map(|(task, c)| (task, TensorShape::new(c, output_size)))
            .collect();
        if outputs.is_empty() {
            return Err(GeometryError::NoTasks);
        }

        let scan_outputs = self
            .tasks
            .scan_channels()
            .into_iter()
            .map(|(task, c)| (task, TensorShape::new(c, output_size)))
            .collect();

        let stride = stride(&output_size, &self.overlap)?;

        Ok(GeometrySpec {
            fov: self.fov,
            input: TensorShape::new(1, input_size),
            outputs,
            scan_outputs,
            scan_params: ScanParams {
                stride,
                blend: self.blend,
            },
        })
    }
}

fn check_extent(name: &'static str, extent: &[usize; 3]) -> Result<(), GeometryError> {
    match extent.iter().position(|&e| e == 0) {
        Some(axis) => Err(GeometryError::EmptyExtent { name, axis }),
        None => Ok(()),
    }
}

/// Per-axis scan stride for a window of `extent` with the given overlap
///
/// # Errors
///
/// Returns an error if an overlap component is not finite or the resulting
/// stride would not advance the window.
pub fn stride(extent: &[usize; 3], overlap: &[f64; 3]) -> Result<[StrideAxis; 3], GeometryError> {
    let mut out = [StrideAxis::Voxels(0); 3];
    for (axis, (&e, &o)) in extent.iter().zip(overlap).enumerate() {
        if !o.is_finite() {
            return Err(GeometryError::NonFiniteOverlap { axis, value: o });
        }
        let s = StrideAxis::from_overlap(e, o);
        if !s.is_positive() {
            return Err(GeometryError::NonPositiveStride {
                axis,
                extent: e,
                overlap: o,
            });
        }
        out[axis] = s;
    }
    Ok(out)
}
