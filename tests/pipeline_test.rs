//! Offline batch integration tests
//!
//! Runs categorize → refine → generate-sets over a small synthetic city in a
//! scratch directory and checks the files each stage leaves behind.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tempfile::TempDir;
use urban_explore::config::{PipelineConfig, SetsConfig};
use urban_explore::{pipeline, poi, Category, Profile};

fn point(name: Option<&str>, tags: Value, x: f64, y: f64) -> Value {
    let mut properties = tags;
    if let Some(name) = name {
        properties["name"] = json!(name);
    }
    json!({
        "type": "Feature",
        "properties": properties,
        "geometry": {"type": "Point", "coordinates": [x, y]}
    })
}

fn square(name: Option<&str>, tags: Value, x0: f64, y0: f64, size: f64) -> Value {
    let mut properties = tags;
    if let Some(name) = name {
        properties["name"] = json!(name);
    }
    json!({
        "type": "Feature",
        "properties": properties,
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [x0, y0], [x0 + size, y0], [x0 + size, y0 + size], [x0, y0 + size], [x0, y0]
            ]]
        }
    })
}

fn write_collection(path: &Path, features: Vec<Value>) {
    fs::write(
        path,
        json!({"type": "FeatureCollection", "features": features}).to_string(),
    )
    .unwrap();
}

fn setup(dir: &Path) -> (PipelineConfig, SetsConfig) {
    let pipeline = PipelineConfig {
        raw_pois: dir.join("pois.geojson"),
        region: dir.join("region.geojson"),
        categorized: dir.join("out/categorized.geojson"),
        filtered: dir.join("out/filtered.geojson"),
        banned_names: Some(dir.join("banned.txt")),
        refined: dir.join("out/refined.geojson"),
    };
    let sets = SetsConfig {
        output_dir: dir.join("static/places"),
        per_profile: 3,
        seed: Some(7),
    };

    write_collection(
        &pipeline.raw_pois,
        vec![
            point(Some("Museo"), json!({"tourism": "museum"}), 1.0, 1.0),
            point(Some("Mirador"), json!({"tourism": "viewpoint"}), 2.0, 2.0),
            point(Some("Bar Central"), json!({"amenity": "pub"}), 3.0, 3.0),
            point(Some("Pub Lejano"), json!({"amenity": "pub"}), 20.0, 20.0),
            point(Some("Tienda Prohibida"), json!({"shop": "clothes"}), 4.0, 4.0),
            point(Some("Panadería"), json!({"shop": "bakery"}), 6.0, 6.0),
            point(
                Some("Plaza Independencia"),
                json!({"main_category": "plaza"}),
                8.0,
                8.0,
            ),
            point(
                Some("Nada"),
                json!({"amenity": null, "main_category": "unknown"}),
                9.0,
                9.0,
            ),
            square(None, json!({"leisure": "park"}), 1.0, 6.0, 2.0),
            square(
                Some("Villa Residencial"),
                json!({"building": "residential"}),
                5.0,
                1.0,
                2.0,
            ),
        ],
    );
    write_collection(
        &pipeline.region,
        vec![square(None, json!({}), 0.0, 0.0, 10.0)],
    );
    fs::write(dir.join("banned.txt"), "Tienda Prohibida\n\n").unwrap();

    (pipeline, sets)
}

fn set_names(path: &Path) -> Vec<String> {
    let collection: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(collection["type"], "FeatureCollection");
    collection["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|feature| {
            assert_eq!(feature["geometry"]["type"], "Point");
            assert!(feature["properties"]["category"].is_string());
            feature["properties"]["name"].as_str().unwrap().to_string()
        })
        .collect()
}

#[test]
fn test_categorize_writes_all_and_filtered() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _) = setup(dir.path());

    let summary = pipeline::categorize(&pipeline).unwrap();
    assert_eq!(summary.categories.total(), 10);
    assert_eq!(summary.categories.unmatched, 1);
    assert_eq!(summary.categories.counts[&Category::TouristPlaces], 2);
    assert_eq!(summary.categories.counts[&Category::Pub], 2);
    assert_eq!(summary.categories.counts[&Category::Storefront], 2);
    assert_eq!(summary.categories.counts[&Category::Plaza], 1);
    assert_eq!(summary.points_kept, 6);
    assert_eq!(summary.areas_kept, 2);
    assert_eq!(summary.outside, 1);

    let categorized = poi::load(&pipeline.categorized).unwrap();
    assert_eq!(categorized.len(), 10);

    let filtered = poi::load(&pipeline.filtered).unwrap();
    assert_eq!(filtered.len(), 8);
    assert!(filtered.iter().all(|p| p.category.is_some()));
    // Points come before areas
    assert!(filtered[..6]
        .iter()
        .all(|p| matches!(p.geometry, Some(poi::Geometry::Point(_)))));
}

#[test]
fn test_refine_drops_unnamed_and_banned() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _) = setup(dir.path());

    pipeline::categorize(&pipeline).unwrap();
    let summary = pipeline::refine(&pipeline).unwrap();
    assert_eq!(summary.kept, 6);
    assert_eq!(summary.unnamed, 1);
    assert_eq!(summary.banned, 1);

    let names: HashSet<String> = poi::load(&pipeline.refined)
        .unwrap()
        .iter()
        .filter_map(|p| p.name().map(str::to_string))
        .collect();
    assert!(names.contains("Museo"));
    assert!(!names.contains("Tienda Prohibida"));
}

#[test]
fn test_generate_sets_end_to_end() {
    let dir = TempDir::new().unwrap();
    let (pipeline, sets) = setup(dir.path());

    pipeline::categorize(&pipeline).unwrap();
    pipeline::refine(&pipeline).unwrap();
    let reports =
        pipeline::generate_sets(&pipeline, &sets, &[Profile::Tourist, Profile::ShopOwner], 3, None)
            .unwrap();

    let (profile, tourist) = &reports[0];
    assert_eq!(*profile, Profile::Tourist);
    assert_eq!(tourist.written.len(), 3);
    assert!(tourist.partial.is_empty());
    for path in &tourist.written {
        let names: HashSet<String> = set_names(path).into_iter().collect();
        let expected: HashSet<String> = ["Museo", "Mirador", "Bar Central"]
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(names, expected);
    }
    assert!(dir.path().join("static/places/tourist/3.geojson").exists());

    // One storefront survives refinement, the shop owner quota asks for two
    let (_, shop_owner) = &reports[1];
    assert_eq!(shop_owner.written.len(), 3);
    assert_eq!(shop_owner.partial, vec![1, 2, 3]);
    let names = set_names(&shop_owner.written[0]);
    assert_eq!(names, vec!["Panadería", "Villa Residencial"]);
}

#[test]
fn test_regeneration_removes_stale_sets() {
    let dir = TempDir::new().unwrap();
    let (pipeline, sets) = setup(dir.path());

    pipeline::categorize(&pipeline).unwrap();
    pipeline::refine(&pipeline).unwrap();
    pipeline::generate_sets(&pipeline, &sets, &[Profile::Tourist], 3, None).unwrap();

    let reports =
        pipeline::generate_sets(&pipeline, &sets, &[Profile::Tourist], 1, Some(1)).unwrap();
    assert_eq!(reports[0].1.removed, 3);

    let remaining: Vec<String> = fs::read_dir(dir.path().join("static/places/tourist"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(remaining, vec!["1.geojson"]);
}

#[test]
fn test_profile_without_candidates_writes_no_files() {
    let dir = TempDir::new().unwrap();
    let (pipeline, sets) = setup(dir.path());
    fs::create_dir_all(pipeline.refined.parent().unwrap()).unwrap();
    write_collection(
        &pipeline.refined,
        vec![point(Some("Café"), json!({"amenity": "cafe", "category": "cafe"}), 1.0, 1.0)],
    );

    let reports = pipeline::generate_sets(&pipeline, &sets, &[Profile::Student], 2, None).unwrap();
    assert!(reports[0].1.written.is_empty());
    assert_eq!(reports[0].1.empty, vec![1, 2]);
}
