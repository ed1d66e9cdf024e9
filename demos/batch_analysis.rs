//! Analyze many properties in parallel.
//!
//! Run with: cargo run --example batch_analysis --features parallel

use poi_proximity::{
    analyze_batch, analyze_batch_parallel, AnalysisConfig, AnalysisJob, AnalysisRequest, Category,
    CategoryFetch, GeoPoint, RawCandidate,
};
use std::time::Instant;

fn synthetic_job(i: usize) -> AnalysisJob {
    let lat = 40.0 + (i % 50) as f64 * 0.1;
    let lng = -75.0 + (i / 50) as f64 * 0.1;
    let center = GeoPoint::new(lat, lng);

    let fetches = Category::ALL
        .iter()
        .enumerate()
        .map(|(c, &category)| {
            let candidates = (0..40)
                .map(|k| {
                    let dlat = ((k * 7 + c * 3) % 29) as f64 * 0.0004 - 0.0058;
                    let dlng = ((k * 11 + c * 5) % 31) as f64 * 0.0004 - 0.0062;
                    RawCandidate::at(lat + dlat, lng + dlng).with_tag("name", format!("{} {}", category, k))
                })
                .collect();
            CategoryFetch::ok(category, candidates)
        })
        .collect();

    AnalysisJob {
        request: AnalysisRequest::new(format!("Property {}", i), center, 1.0),
        fetches,
    }
}

fn main() {
    pretty_env_logger::init();

    println!("Batch POI Analysis Example\n");

    let config = AnalysisConfig::default();
    let count = 200;

    let jobs: Vec<AnalysisJob> = (0..count).map(synthetic_job).collect();

    let start = Instant::now();
    let sequential = analyze_batch(&jobs, &config);
    let sequential_time = start.elapsed();

    let start = Instant::now();
    let parallel = analyze_batch_parallel(&jobs, &config);
    let parallel_time = start.elapsed();

    let kept: usize = parallel
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|r| r.pois.len())
        .sum();

    println!("Properties: {}", count);
    println!("POIs kept:  {}", kept);
    println!("Sequential: {:?}", sequential_time);
    println!("Parallel:   {:?}", parallel_time);

    let same = sequential
        .iter()
        .zip(&parallel)
        .all(|(a, b)| match (a, b) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        });
    println!("Identical results: {}", same);
}
