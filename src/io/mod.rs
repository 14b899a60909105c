//! Volumetric array readers.
//!
//! The assembler never touches files directly. It goes through a
//! [`VolumeReader`], which turns a path into a [`RawVolume`] in whatever
//! element type the file stores; casting to the working type happens
//! afterwards in the channel loader.
//!
//! [`NpyReader`] reads NumPy `.npy` arrays (C or Fortran order, any plain
//! integer, float or bool element type). Other formats plug in by
//! implementing the trait.
//!
//! [`RawVolume`]: crate::core::volume::RawVolume

pub mod reader;

pub use reader::{NpyReader, ReadError, VolumeReader};
