use ndarray::{ArrayD, IxDyn, ShapeBuilder};
use npyz::{DType, NpyFile, Order};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::volume::RawVolume;
use crate::utils::validation::is_npy;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported volume format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Unsupported element type '{dtype}' in {}", path.display())]
    UnsupportedDtype { path: PathBuf, dtype: String },

    #[error("Corrupt volume {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl ReadError {
    /// Path of the file that failed
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::UnsupportedFormat { path }
            | Self::UnsupportedDtype { path, .. }
            | Self::Corrupt { path, .. } => path,
        }
    }
}

/// Reads an N-dimensional array from a file.
///
/// Implementations must be safe to call concurrently on distinct paths.
pub trait VolumeReader: Send + Sync {
    /// Read the array stored at `path`
    ///
    /// # Errors
    ///
    /// Returns a `ReadError` if the file is missing, unreadable, or corrupt.
    fn read(&self, path: &Path) -> Result<RawVolume, ReadError>;
}

impl<R: VolumeReader + ?Sized> VolumeReader for &R {
    fn read(&self, path: &Path) -> Result<RawVolume, ReadError> {
        (**self).read(path)
    }
}

/// Reader for NumPy `.npy` files
#[derive(Debug, Clone, Copy, Default)]
pub struct NpyReader;

impl VolumeReader for NpyReader {
    fn read(&self, path: &Path) -> Result<RawVolume, ReadError> {
        let bytes = std::fs::read(path).map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if !is_npy(&bytes) {
            return Err(ReadError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }

        let npy = NpyFile::new(&bytes[..]).map_err(|e| corrupt(path, &e))?;
        let shape: Vec<usize> = npy
            .shape()
            .iter()
            .map(|&d| usize::try_from(d))
            .collect::<Result<_, _>>()
            .map_err(|e| corrupt(path, &e))?;

        let type_str = match npy.dtype() {
            DType::Plain(type_str) => type_str.to_string(),
            other => {
                return Err(ReadError::UnsupportedDtype {
                    path: path.to_path_buf(),
                    dtype: format!("{other:?}"),
                })
            }
        };

        // Drop the byte-order character: "<u4" -> "u4"
        let code = type_str.get(1..).unwrap_or_default();
        let volume = match code {
            "b1" => RawVolume::Bool(to_array(npy, &shape, path)?),
            "u1" => RawVolume::U8(to_array(npy, &shape, path)?),
            "u2" => RawVolume::U16(to_array(npy, &shape, path)?),
            "u4" => RawVolume::U32(to_array(npy, &shape, path)?),
            "u8" => RawVolume::U64(to_array(npy, &shape, path)?),
            "i1" => RawVolume::I8(to_array(npy, &shape, path)?),
            "i2" => RawVolume::I16(to_array(npy, &shape, path)?),
            "i4" => RawVolume::I32(to_array(npy, &shape, path)?),
            "i8" => RawVolume::I64(to_array(npy, &shape, path)?),
            "f4" => RawVolume::F32(to_array(npy, &shape, path)?),
            "f8" => RawVolume::F64(to_array(npy, &shape, path)?),
            _ => {
                return Err(ReadError::UnsupportedDtype {
                    path: path.to_path_buf(),
                    dtype: type_str.clone(),
                })
            }
        };

        Ok(volume)
    }
}

fn to_array<T: npyz::Deserialize>(
    npy: NpyFile<&[u8]>,
    shape: &[usize],
    path: &Path,
) -> Result<ArrayD<T>, ReadError> {
    let order = npy.order();
    let data = npy.into_vec::<T>().map_err(|e| corrupt(path, &e))?;

    let array = match order {
        Order::C => ArrayD::from_shape_vec(IxDyn(shape), data),
        Order::Fortran => ArrayD::from_shape_vec(IxDyn(shape).f(), data),
    };
    array.map_err(|e| corrupt(path, &e))
}

fn corrupt(path: &Path, err: &dyn std::fmt::Display) -> ReadError {
    ReadError::Corrupt {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// In-memory reader keyed by path, for unit tests
#[cfg(test)]
pub(crate) mod testing {
    use super::{ReadError, VolumeReader};
    use crate::core::volume::RawVolume;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryReader {
        files: HashMap<PathBuf, RawVolume>,
        reads: Mutex<Vec<PathBuf>>,
    }

    impl MemoryReader {
        pub fn with(mut self, path: impl Into<PathBuf>, volume: RawVolume) -> Self {
            self.files.insert(path.into(), volume);
            self
        }

        /// Paths read so far, in call order
        pub fn reads(&self) -> Vec<PathBuf> {
            self.reads.lock().unwrap().clone()
        }
    }

    impl VolumeReader for MemoryReader {
        fn read(&self, path: &Path) -> Result<RawVolume, ReadError> {
            self.reads.lock().unwrap().push(path.to_path_buf());
            self.files.get(path).cloned().ok_or_else(|| ReadError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use npyz::WriterBuilder;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_npy<T: npyz::AutoSerialize + Copy>(path: &Path, shape: &[u64], data: &[T]) {
        let mut out = Vec::new();
        let mut writer = npyz::WriteOptions::new()
            .default_dtype()
            .shape(shape)
            .writer(&mut out)
            .begin_nd()
            .unwrap();
        writer.extend(data.iter().copied()).unwrap();
        writer.finish().unwrap();
        std::fs::write(path, out).unwrap();
    }

    #[test]
    fn test_read_u8_volume() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("msk.h5");
        write_npy(&path, &[2, 2, 3], &[0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);

        let volume = NpyReader.read(&path).unwrap();
        assert_eq!(volume.shape(), &[2, 2, 3]);
        match volume {
            RawVolume::U8(a) => assert_eq!(a[[1, 0, 2]], 8),
            other => panic!("unexpected volume {other:?}"),
        }
    }

    #[test]
    fn test_read_f64_volume() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("img.npy");
        write_npy(&path, &[1, 1, 2], &[0.5f64, 1.5]);

        let volume = NpyReader.read(&path).unwrap();
        assert!(matches!(volume, RawVolume::F64(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.h5");
        let err = NpyReader.read(&path).unwrap_err();
        assert!(matches!(err, ReadError::Io { .. }));
        assert_eq!(err.path(), path.as_path());
    }

    #[test]
    fn test_not_npy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("img.h5");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"\x89HDF\r\n\x1a\n").unwrap();

        let err = NpyReader.read(&path).unwrap_err();
        assert!(matches!(err, ReadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_truncated_npy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("img.h5");
        write_npy(&path, &[4, 4], &[1u32; 16]);
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();

        let err = NpyReader.read(&path).unwrap_err();
        assert!(matches!(err, ReadError::Corrupt { .. }));
    }
}
