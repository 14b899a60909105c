//! Typed in-memory volumes.
//!
//! [`RawVolume`] is what the array reader hands back, in whatever element type
//! the file stores. [`Volume`] is the normalized form kept in a bundle: one of
//! the three element kinds the assembler works with.

use ndarray::{ArrayD, IxDyn, Zip};

use crate::core::types::ElementKind;

/// Maximum value of an 8-bit image, used to rescale to [0, 1]
pub const IMAGE_MAX: f32 = 255.0;

/// An array as stored on disk, before casting
#[derive(Debug, Clone, PartialEq)]
pub enum RawVolume {
    Bool(ArrayD<bool>),
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

// Numeric `as` casts, saturating for float -> int.
macro_rules! cast_raw {
    ($raw:expr, $t:ty) => {
        match $raw {
            RawVolume::Bool(a) => a.mapv(|v| <$t>::from(u8::from(v))),
            RawVolume::U8(a) => a.mapv(|v| v as $t),
            RawVolume::U16(a) => a.mapv(|v| v as $t),
            RawVolume::U32(a) => a.mapv(|v| v as $t),
            RawVolume::U64(a) => a.mapv(|v| v as $t),
            RawVolume::I8(a) => a.mapv(|v| v as $t),
            RawVolume::I16(a) => a.mapv(|v| v as $t),
            RawVolume::I32(a) => a.mapv(|v| v as $t),
            RawVolume::I64(a) => a.mapv(|v| v as $t),
            RawVolume::F32(a) => a.mapv(|v| v as $t),
            RawVolume::F64(a) => a.mapv(|v| v as $t),
        }
    };
}

impl RawVolume {
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Bool(a) => a.shape(),
            Self::U8(a) => a.shape(),
            Self::U16(a) => a.shape(),
            Self::U32(a) => a.shape(),
            Self::U64(a) => a.shape(),
            Self::I8(a) => a.shape(),
            Self::I16(a) => a.shape(),
            Self::I32(a) => a.shape(),
            Self::I64(a) => a.shape(),
            Self::F32(a) => a.shape(),
            Self::F64(a) => a.shape(),
        }
    }

    /// Cast to the requested element kind.
    ///
    /// `F32` additionally divides by [`IMAGE_MAX`] so 8-bit imagery lands in
    /// the unit interval.
    #[must_use]
    pub fn cast(&self, element: ElementKind) -> Volume {
        match element {
            ElementKind::F32 => {
                let mut data: ArrayD<f32> = cast_raw!(self, f32);
                data.par_mapv_inplace(|v| v / IMAGE_MAX);
                Volume::F32(data)
            }
            ElementKind::U8 => Volume::U8(cast_raw!(self, u8)),
            ElementKind::U32 => Volume::U32(cast_raw!(self, u32)),
        }
    }
}

/// A loaded channel in its working element type
#[derive(Debug, Clone, PartialEq)]
pub enum Volume {
    F32(ArrayD<f32>),
    U8(ArrayD<u8>),
    U32(ArrayD<u32>),
}

impl Volume {
    /// Zero-filled volume of the given extent
    #[must_use]
    pub fn zeros(shape: &[usize], element: ElementKind) -> Self {
        let dim = IxDyn(shape);
        match element {
            ElementKind::F32 => Self::F32(ArrayD::zeros(dim)),
            ElementKind::U8 => Self::U8(ArrayD::zeros(dim)),
            ElementKind::U32 => Self::U32(ArrayD::zeros(dim)),
        }
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::F32(a) => a.shape(),
            Self::U8(a) => a.shape(),
            Self::U32(a) => a.shape(),
        }
    }

    #[must_use]
    pub fn element(&self) -> ElementKind {
        match self {
            Self::F32(_) => ElementKind::F32,
            Self::U8(_) => ElementKind::U8,
            Self::U32(_) => ElementKind::U32,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            Self::F32(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u8(&self) -> Option<&ArrayD<u8>> {
        match self {
            Self::U8(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_u8_mut(&mut self) -> Option<&mut ArrayD<u8>> {
        match self {
            Self::U8(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u32(&self) -> Option<&ArrayD<u32>> {
        match self {
            Self::U32(a) => Some(a),
            _ => None,
        }
    }

    /// Number of elements that are not zero
    #[must_use]
    pub fn count_nonzero(&self) -> usize {
        match self {
            Self::F32(a) => a.iter().filter(|&&v| v != 0.0).count(),
            Self::U8(a) => a.iter().filter(|&&v| v != 0).count(),
            Self::U32(a) => a.iter().filter(|&&v| v != 0).count(),
        }
    }
}

/// Zero every mask position where `fold` is positive.
///
/// Both arrays must have the same extent; callers validate that first.
pub fn exclude_folds(mask: &mut ArrayD<u8>, fold: &ArrayD<u8>) {
    Zip::from(mask).and(fold).par_for_each(|m, &f| {
        if f > 0 {
            *m = 0;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array3};

    #[test]
    fn test_cast_image_rescales() {
        let raw = RawVolume::U8(arr1(&[0u8, 51, 255]).into_dyn());
        let volume = raw.cast(ElementKind::F32);
        let data = volume.as_f32().unwrap();
        assert_eq!(data.as_slice().unwrap(), &[0.0, 0.2, 1.0]);
    }

    #[test]
    fn test_cast_segmentation_keeps_ids() {
        let raw = RawVolume::U64(arr1(&[0u64, 7, 70_000]).into_dyn());
        let volume = raw.cast(ElementKind::U32);
        assert_eq!(volume.element(), ElementKind::U32);
        assert_eq!(volume.as_u32().unwrap().as_slice().unwrap(), &[0, 7, 70_000]);
    }

    #[test]
    fn test_cast_bool_mask() {
        let raw = RawVolume::Bool(arr1(&[true, false, true]).into_dyn());
        let volume = raw.cast(ElementKind::U8);
        assert_eq!(volume.as_u8().unwrap().as_slice().unwrap(), &[1, 0, 1]);
    }

    #[test]
    fn test_zeros() {
        let volume = Volume::zeros(&[2, 3, 4], ElementKind::U8);
        assert_eq!(volume.shape(), &[2, 3, 4]);
        assert_eq!(volume.len(), 24);
        assert_eq!(volume.count_nonzero(), 0);
    }

    #[test]
    fn test_exclude_folds() {
        let mut mask = Array3::<u8>::ones((1, 2, 2)).into_dyn();
        let fold = Array3::from_shape_vec((1, 2, 2), vec![0u8, 3, 0, 1])
            .unwrap()
            .into_dyn();

        exclude_folds(&mut mask, &fold);
        assert_eq!(mask.as_slice().unwrap(), &[1, 0, 1, 0]);

        // Fusing the same fold again changes nothing
        let once = mask.clone();
        exclude_folds(&mut mask, &fold);
        assert_eq!(mask, once);
    }
}
