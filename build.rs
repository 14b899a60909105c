use std::collections::HashMap;
use std::path::Path;

const REQUIRED_CHANNELS: [&str; 2] = ["img", "msk"];
const KNOWN_CHANNELS: [&str; 6] = ["img", "seg", "msk", "mye", "blv", "fld"];

fn main() {
    let catalog_path = Path::new("catalogs/em_datasets.json");
    validate_catalog_file(catalog_path);
    set_build_dependencies();
}

fn validate_catalog_file(catalog_path: &Path) {
    // Ensure catalog exists at build time
    assert!(
        catalog_path.exists(),
        "\n\nCATALOG BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the catalog file before building.\n",
        catalog_path.display()
    );

    let catalog_contents = std::fs::read_to_string(catalog_path).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            catalog_path.display()
        );
    });

    let registry: serde_json::Value = serde_json::from_str(&catalog_contents).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            catalog_path.display()
        );
    });

    validate_registry_structure(&registry);
}

fn validate_registry_structure(registry: &serde_json::Value) {
    assert!(
        registry.is_object(),
        "\n\nCATALOG BUILD ERROR: Root must be a JSON object\n\
         Got: {registry}\n"
    );

    let catalogs = registry
        .get("catalogs")
        .and_then(serde_json::Value::as_array)
        .unwrap_or_else(|| {
            panic!(
                "\n\nCATALOG BUILD ERROR: Missing 'catalogs' array\n\
                 The registry must have a top-level 'catalogs' array.\n"
            );
        });

    // dataset id -> owning catalog
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut total_datasets = 0;

    for (i, catalog) in catalogs.iter().enumerate() {
        let name = catalog
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_else(|| panic!("\n\nCATALOG BUILD ERROR: Catalog {i} missing 'name'\n"));

        assert!(
            catalog.get("subdir").and_then(serde_json::Value::as_str).is_some(),
            "\n\nCATALOG BUILD ERROR: Catalog '{name}' missing 'subdir'\n"
        );

        let datasets = catalog
            .get("datasets")
            .and_then(serde_json::Value::as_array)
            .unwrap_or_else(|| {
                panic!("\n\nCATALOG BUILD ERROR: Catalog '{name}' missing 'datasets' array\n")
            });

        for (j, dataset) in datasets.iter().enumerate() {
            let id = validate_dataset(dataset, name, j);
            if let Some(previous) = owners.insert(id.to_string(), name.to_string()) {
                panic!(
                    "\n\nCATALOG BUILD ERROR: Dataset '{id}' declared in '{previous}' and '{name}'\n\
                     Identifiers must be unique across all catalogs.\n"
                );
            }
        }
        total_datasets += datasets.len();
    }

    println!(
        "cargo:warning=Validated catalog: {} collections, {total_datasets} datasets",
        catalogs.len()
    );
}

fn validate_dataset<'a>(dataset: &'a serde_json::Value, catalog: &str, index: usize) -> &'a str {
    let id = dataset
        .get("id")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_else(|| {
            panic!("\n\nCATALOG BUILD ERROR: Dataset {index} in '{catalog}' missing 'id'\n")
        });

    assert!(
        dataset.get("loc").and_then(serde_json::Value::as_bool).is_some(),
        "\n\nCATALOG BUILD ERROR: Dataset '{id}' in '{catalog}' missing boolean 'loc'\n"
    );

    let files = dataset
        .get("files")
        .and_then(serde_json::Value::as_object)
        .unwrap_or_else(|| {
            panic!("\n\nCATALOG BUILD ERROR: Dataset '{id}' in '{catalog}' missing 'files'\n")
        });

    for channel in REQUIRED_CHANNELS {
        assert!(
            files.contains_key(channel),
            "\n\nCATALOG BUILD ERROR: Dataset '{id}' in '{catalog}' missing required channel '{channel}'\n"
        );
    }
    for channel in files.keys() {
        assert!(
            KNOWN_CHANNELS.contains(&channel.as_str()),
            "\n\nCATALOG BUILD ERROR: Dataset '{id}' in '{catalog}' has unknown channel '{channel}'\n"
        );
    }

    id
}

fn set_build_dependencies() {
    // Tell cargo to rerun if catalog changes
    println!("cargo:rerun-if-changed=catalogs/em_datasets.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
