//! Dataset assembly over `.npy` volumes on disk
//!
//! Each test writes a small collection into a temporary data root, loads a
//! registry describing it, and assembles bundles through `NpyReader`.

use em_dataprep::core::bundle::Plane;
use em_dataprep::core::types::{DatasetId, Target, TargetSet};
use em_dataprep::dataset::{AssembleError, LoadFailure};
use em_dataprep::{CatalogRegistry, CatalogResolver, NpyReader};
use npyz::WriterBuilder;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const SUBDIR: &str = "coll/gt";
const SHAPE: [u64; 3] = [2, 2, 2];

const REGISTRY: &str = r#"{
  "version": "1.0.0",
  "catalogs": [
    {
      "name": "coll",
      "subdir": "coll/gt",
      "datasets": [
        {"id": "vol1", "files": {"img": "img.h5", "seg": "seg.h5", "msk": "msk.h5", "fld": "fld.h5"}, "loc": true},
        {"id": "vol1a", "files": {"img": "img.h5", "seg": "seg.h5", "msk": "msk.h5"}, "loc": false},
        {"id": "vol2", "files": {"img": "img.h5", "msk": "msk.h5", "mye": "mye.h5"}, "loc": true},
        {"id": "stitched_vol19-vol34", "files": {"img": "img.h5", "seg": "seg.h5", "msk": "msk.h5"}, "loc": true}
      ]
    }
  ]
}"#;

fn write_npy<T: npyz::AutoSerialize + Copy>(path: &Path, data: &[T]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut out = Vec::new();
    let mut writer = npyz::WriteOptions::new()
        .default_dtype()
        .shape(&SHAPE)
        .writer(&mut out)
        .begin_nd()
        .unwrap();
    writer.extend(data.iter().copied()).unwrap();
    writer.finish().unwrap();
    std::fs::write(path, out).unwrap();
}

fn dataset_dir(root: &TempDir, dir: &str) -> std::path::PathBuf {
    root.path().join(SUBDIR).join(dir)
}

/// Populate the data root for every dataset in `REGISTRY`
fn data_root() -> TempDir {
    let root = tempdir().unwrap();

    let vol1 = dataset_dir(&root, "vol1");
    write_npy(&vol1.join("img.h5"), &[0u8, 51, 102, 153, 204, 255, 0, 255]);
    write_npy(&vol1.join("seg.h5"), &[1u32, 1, 2, 2, 3, 3, 4, 4]);
    write_npy(&vol1.join("msk.h5"), &[1u8; 8]);
    write_npy(&vol1.join("fld.h5"), &[0u8, 0, 0, 1, 0, 0, 0, 2]);

    let vol2 = dataset_dir(&root, "vol2");
    write_npy(&vol2.join("img.h5"), &[128u8; 8]);
    write_npy(&vol2.join("msk.h5"), &[1u8; 8]);
    write_npy(&vol2.join("mye.h5"), &[0u8, 1, 0, 1, 0, 1, 0, 1]);

    let stitched = dataset_dir(&root, "stitched_vol19-vol34");
    write_npy(&stitched.join("img.h5"), &[10u8; 8]);
    write_npy(&stitched.join("seg.h5"), &[7u32; 8]);
    write_npy(&stitched.join("msk_train.h5"), &[1u8, 1, 1, 1, 0, 0, 0, 0]);
    write_npy(&stitched.join("msk_val.h5"), &[0u8, 0, 0, 0, 1, 1, 1, 1]);

    root
}

fn registry() -> CatalogRegistry {
    CatalogRegistry::from_json(REGISTRY).unwrap()
}

fn targets(list: &[Target]) -> TargetSet {
    list.iter().copied().collect()
}

#[test]
fn test_load_all_datasets() {
    let root = data_root();
    let registry = registry();
    let resolver = CatalogResolver::new(&registry, &NpyReader);

    let batch = resolver
        .load_many(root.path(), None, &targets(&[Target::Affinity]))
        .unwrap();

    // vol2 declares no segmentation
    assert_eq!(batch.bundles.len(), 3);
    assert!(matches!(
        batch.failures[&DatasetId::new("vol2")],
        LoadFailure::Assemble(AssembleError::MissingChannel { .. })
    ));
}

#[test]
fn test_image_is_rescaled() {
    let root = data_root();
    let registry = registry();
    let resolver = CatalogResolver::new(&registry, &NpyReader);

    let bundle = resolver
        .load(root.path(), &DatasetId::new("vol1"), &targets(&[Target::Mask]))
        .unwrap();
    let image = bundle.image().as_f32().unwrap();
    assert_eq!(image.shape(), &[2, 2, 2]);
    assert!((image[[0, 0, 1]] - 0.2).abs() < 1e-6);
    assert!((image[[1, 0, 1]] - 1.0).abs() < 1e-6);
    assert!(image.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn test_folds_are_excluded_from_mask() {
    let root = data_root();
    let registry = registry();
    let resolver = CatalogResolver::new(&registry, &NpyReader);

    let bundle = resolver
        .load(
            root.path(),
            &DatasetId::new("vol1"),
            &targets(&[Target::Affinity]),
        )
        .unwrap();
    let mask = bundle.get(Plane::Mask).unwrap().as_u8().unwrap();
    assert_eq!(mask.iter().copied().collect::<Vec<_>>(), vec![1, 1, 1, 0, 1, 1, 1, 0]);

    let seg = bundle.get(Plane::Segmentation).unwrap().as_u32().unwrap();
    assert_eq!(seg[[1, 1, 1]], 4);
}

#[test]
fn test_duplicate_reads_shared_directory() {
    let root = data_root();
    let registry = registry();
    let resolver = CatalogResolver::new(&registry, &NpyReader);

    let bundle = resolver
        .load(root.path(), &DatasetId::new("vol1a"), &targets(&[Target::Mask]))
        .unwrap();
    assert_eq!(bundle.id, DatasetId::new("vol1a"));
    assert!(!bundle.has_location);

    // No fold declared for the alternate annotation
    let mask = bundle.get(Plane::Mask).unwrap().as_u8().unwrap();
    assert!(mask.iter().all(|&v| v == 1));
}

#[test]
fn test_pre_split_masks() {
    let root = data_root();
    let registry = registry();
    let resolver = CatalogResolver::new(&registry, &NpyReader);

    let bundle = resolver
        .load(
            root.path(),
            &DatasetId::new("stitched_vol19-vol34"),
            &targets(&[Target::Mask]),
        )
        .unwrap();
    assert!(!bundle.contains(Plane::Mask));
    assert_eq!(bundle.get(Plane::TrainMask).unwrap().count_nonzero(), 4);
    assert_eq!(bundle.get(Plane::ValMask).unwrap().count_nonzero(), 4);
}

#[test]
fn test_myelin_and_blood_vessel() {
    let root = data_root();
    let registry = registry();
    let resolver = CatalogResolver::new(&registry, &NpyReader);
    let requested = targets(&[Target::Myelin, Target::BloodVessel]);

    let vol2 = resolver
        .load(root.path(), &DatasetId::new("vol2"), &requested)
        .unwrap();
    assert_eq!(vol2.get(Plane::Myelin).unwrap().count_nonzero(), 4);

    // Not declared, zero-filled to the image extent
    let blv = vol2.get(Plane::BloodVessel).unwrap();
    assert_eq!(blv.shape(), &[2, 2, 2]);
    assert_eq!(blv.count_nonzero(), 0);
}

#[test]
fn test_shape_mismatch() {
    let root = data_root();
    let vol2 = dataset_dir(&root, "vol2");
    let mut out = Vec::new();
    let mut writer = npyz::WriteOptions::new()
        .default_dtype()
        .shape(&[1, 2, 2])
        .writer(&mut out)
        .begin_nd()
        .unwrap();
    writer.extend([1u8; 4]).unwrap();
    writer.finish().unwrap();
    std::fs::write(vol2.join("msk.h5"), out).unwrap();

    let registry = registry();
    let resolver = CatalogResolver::new(&registry, &NpyReader);
    let err = resolver
        .load(root.path(), &DatasetId::new("vol2"), &targets(&[Target::Mask]))
        .unwrap_err();
    assert!(matches!(
        err,
        LoadFailure::Assemble(AssembleError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_missing_data_root() {
    let root = tempdir().unwrap();
    let registry = registry();
    let resolver = CatalogResolver::new(&registry, &NpyReader);

    let batch = resolver
        .load_many(root.path(), None, &targets(&[Target::Mask]))
        .unwrap();
    assert!(batch.bundles.is_empty());
    assert_eq!(batch.failures.len(), 4);
    assert!(batch
        .failures
        .values()
        .all(|f| matches!(f, LoadFailure::Assemble(AssembleError::Read(_)))));
}

#[test]
fn test_embedded_registry_identifiers_unique() {
    let registry = CatalogRegistry::load_embedded().unwrap();
    let ids = registry.ids();
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(ids.len(), unique.len());
    assert_eq!(ids.len(), registry.len());
    assert_eq!(registry.catalogs().len(), 3);
}
