//! End-to-end analysis and report file output.

use poi_proximity::{
    analyze, assign_clusters, deduplicate, AnalysisConfig, AnalysisRequest, Category, CategoryFetch,
    GeoPoint, PoiError, PoiReport, RawCandidate,
};
use std::collections::BTreeSet;

fn request() -> AnalysisRequest {
    AnalysisRequest::new("127 West Lane, Ridgefield, CT", GeoPoint::new(41.2811, -73.4985), 1.0)
}

#[test]
fn test_empty_input_everywhere() {
    assert!(deduplicate(&[], 0.05).is_empty());
    assert!(assign_clusters(&[], &BTreeSet::from([Category::Parking]), 0.25).is_empty());

    let report = analyze(&request(), &[], &AnalysisConfig::default()).unwrap();
    assert!(report.is_empty());
    assert!(report.clusters.is_empty());
}

#[test]
fn test_nan_geometry_never_reaches_dedup() {
    let fetches = vec![CategoryFetch::ok(
        Category::Park,
        vec![
            RawCandidate::at(f64::NAN, -73.4985).with_tag("name", "Ghost Park"),
            RawCandidate::at(41.2820, -73.4985).with_tag("name", "Real Park"),
        ],
    )];

    let report = analyze(&request(), &fetches, &AnalysisConfig::default()).unwrap();
    assert_eq!(report.pois.len(), 1);
    assert_eq!(report.pois[0].poi.name, "Real Park");
}

#[test]
fn test_fallback_fields_in_report() {
    let fetches = vec![
        CategoryFetch::ok(
            Category::Fuel,
            vec![RawCandidate::at(41.2830, -73.4950).with_tag("brand", "Citgo")],
        ),
        CategoryFetch::ok(Category::BusStop, vec![RawCandidate::at(41.2790, -73.5010)]),
    ];

    let report = analyze(&request(), &fetches, &AnalysisConfig::default()).unwrap();
    let fuel = report.pois.iter().find(|p| p.poi.category == Category::Fuel).unwrap();
    assert_eq!(fuel.poi.name, "Citgo");
    assert_eq!(fuel.poi.address, "41.283000, -73.495000");

    let stop = report.pois.iter().find(|p| p.poi.category == Category::BusStop).unwrap();
    assert_eq!(stop.poi.name, "bus_stop");
    assert_eq!(stop.poi.address, "41.279000, -73.501000");
}

#[test]
fn test_write_and_read_report() {
    let fetches = vec![
        CategoryFetch::ok(
            Category::Library,
            vec![RawCandidate::at(41.2820, -73.4980)
                .with_osm_id(7)
                .with_tag("name", "Ridgefield Library")
                .with_tag("addr:full", "472 Main St, Ridgefield, CT 06877")],
        ),
        CategoryFetch::ok(
            Category::Highway,
            vec![RawCandidate::at(41.2900, -73.5050).with_tag("name", "Route 7")],
        ),
        CategoryFetch::failed(Category::School, PoiError::Status(503)),
    ];
    let report = analyze(&request(), &fetches, &AnalysisConfig::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("poi_analysis.json");
    report.write_json(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["location"], "127 West Lane, Ridgefield, CT");
    assert_eq!(value["failed_categories"], serde_json::json!(["school"]));
    assert_eq!(value["clusters"]["highway"].as_array().unwrap().len(), 1);
    assert!(value["pois"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p["address"] == "472 Main St, Ridgefield, CT 06877"));

    let back = PoiReport::read_json(&path).unwrap();
    assert_eq!(back, report);
}

#[test]
fn test_write_to_missing_directory_fails() {
    let report = analyze(&request(), &[], &AnalysisConfig::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("report.json");
    assert!(matches!(report.write_json(&path), Err(PoiError::Io(_))));
}
