//! Fetch live candidates from Overpass and analyze them.
//!
//! Run with: RUST_LOG=info cargo run --example overpass_lookup --features http -- 41.2811 -73.4985
//! or with an address: ... --features http -- "127 West Lane, Ridgefield, CT"

use poi_proximity::{
    analyze, AnalysisConfig, AnalysisRequest, Category, FetchConfig, GeoPoint, OverpassClient,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let client = OverpassClient::new(FetchConfig::default())?;

    let request = match args.as_slice() {
        [lat, lng, ..] => {
            let (lat, lng): (f64, f64) = (lat.parse()?, lng.parse()?);
            AnalysisRequest::new(format!("{:.4}, {:.4}", lat, lng), GeoPoint::new(lat, lng), 1.0)
        }
        [location] => AnalysisRequest::geocoded(&client, location.as_str(), 1.0).await?,
        [] => AnalysisRequest::new("127 West Lane, Ridgefield, CT", GeoPoint::new(41.2811, -73.4985), 1.0),
    };

    let fetches = client.fetch_all(&request, &Category::ALL).await;
    let config = AnalysisConfig::default();
    let report = analyze(&request, &fetches, &config)?;

    if report.is_empty() {
        println!("No points of interest found.");
        return Ok(());
    }

    let payload = report.summary_payload("multifamily");
    println!(
        "{} positive / {} negative POIs within {} mi of {}",
        payload.positive_pois.len(),
        payload.negative_pois.len(),
        payload.radius_miles,
        payload.location
    );

    report.write_json("poi_analysis.json")?;
    println!("Wrote poi_analysis.json");
    Ok(())
}
