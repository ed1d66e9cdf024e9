//! Analyze a hand-built set of category results around one property.
//!
//! Run with: RUST_LOG=debug cargo run --example analyze_fixture

use poi_proximity::{
    analyze, AnalysisConfig, AnalysisRequest, Category, CategoryFetch, GeoPoint, PoiError,
    RawCandidate,
};

fn main() -> Result<(), PoiError> {
    pretty_env_logger::init();

    let request = AnalysisRequest::new(
        "127 West Lane, Ridgefield, CT",
        GeoPoint::new(41.2811, -73.4985),
        1.0,
    );

    let fetches = vec![
        CategoryFetch::ok(
            Category::Supermarket,
            vec![RawCandidate::at(41.2830, -73.4990)
                .with_osm_id(1001)
                .with_tag("name", "Village Market")
                .with_tag("addr:housenumber", "12")
                .with_tag("addr:street", "Main Street")],
        ),
        // Same building, tagged twice upstream
        CategoryFetch::ok(
            Category::Pharmacy,
            vec![RawCandidate::at(41.28302, -73.49902)
                .with_osm_id(1002)
                .with_tag("brand", "CVS")],
        ),
        CategoryFetch::ok(
            Category::Parking,
            (0..12)
                .map(|i| RawCandidate::at(41.2790 + f64::from(i) * 0.0003, -73.4960))
                .collect(),
        ),
        CategoryFetch::ok(
            Category::Highway,
            vec![RawCandidate::at(41.2900, -73.5100).with_tag("name", "Route 7")],
        ),
        CategoryFetch::failed(Category::Park, PoiError::Status(504)),
    ];

    let config = AnalysisConfig::default();
    let report = analyze(&request, &fetches, &config)?;

    println!("POI analysis for {}\n", report.location);
    if report.is_empty() {
        println!("No points of interest found.");
        return Ok(());
    }

    for p in &report.pois {
        println!(
            "  [{}] {:<16} {:>6.3} mi  {:<20} {}",
            p.poi.polarity, p.poi.category, p.poi.distance_miles, p.poi.name, p.poi.address
        );
        if p.categories.len() > 1 {
            println!("        merged categories: {:?}", p.categories);
        }
    }

    println!("\nClusters:");
    for (category, representatives) in &report.clusters {
        println!("  {}: {} representative(s)", category, representatives.len());
    }

    println!("\nMarkers: {}", report.markers(&config).len());
    if !report.failed_categories.is_empty() {
        println!("Failed categories: {:?}", report.failed_categories);
    }

    println!("\n{}", report.to_json_string()?);
    Ok(())
}
