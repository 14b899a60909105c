//! Core data types for EM dataset assembly and model geometry.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`DatasetId`], [`ChannelKind`], [`Target`]: identifiers and the
//!   channel/target vocabulary
//! - [`Volume`], [`RawVolume`]: typed N-dimensional arrays
//! - [`DatasetBundle`]: all planes assembled for one dataset
//! - [`GeometryConfig`], [`GeometrySpec`]: tensor shapes and scan stride
//!
//! ## Channels
//!
//! | Key   | Channel       | Element  | Required | Zero-filled if absent |
//! |-------|---------------|----------|----------|-----------------------|
//! | `img` | image         | `f32`    | yes      | no                    |
//! | `seg` | segmentation  | `u32`    | no       | no                    |
//! | `msk` | mask          | `u8`     | yes      | no                    |
//! | `mye` | myelin        | `u8`     | no       | yes                   |
//! | `blv` | blood vessel  | `u8`     | no       | yes                   |
//! | `fld` | fold          | `u8`     | no       | no                    |
//!
//! [`DatasetId`]: types::DatasetId
//! [`ChannelKind`]: types::ChannelKind
//! [`Target`]: types::Target
//! [`Volume`]: volume::Volume
//! [`RawVolume`]: volume::RawVolume
//! [`DatasetBundle`]: bundle::DatasetBundle
//! [`GeometryConfig`]: geometry::GeometryConfig
//! [`GeometrySpec`]: geometry::GeometrySpec

pub mod bundle;
pub mod geometry;
pub mod types;
pub mod volume;
