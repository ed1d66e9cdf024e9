//! One analysis run: per-category fetch results in, [`PoiReport`] out.
//!
//! Pipeline:
//! 1. Extract POIs from every successful category fetch
//! 2. Deduplicate by proximity
//! 3. Cap the number of POIs per category
//! 4. Assign cluster representatives for singleton categories
//!
//! A category whose fetch failed contributes zero points and is listed in
//! [`PoiReport::failed_categories`]. The run itself only fails on invalid
//! configuration or an invalid request.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::{
    assign_clusters, cap_per_category, check_distance, deduplicate, AnalysisConfig, Category,
    GeoPoint, Poi, PoiError, PoiReport, RawCandidate, Result,
};

/// The property being analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Human-readable location, e.g. a street address
    pub location: String,
    pub center: GeoPoint,
    /// Search radius around the center
    pub radius_miles: f64,
}

impl AnalysisRequest {
    pub fn new(location: impl Into<String>, center: GeoPoint, radius_miles: f64) -> Self {
        Self {
            location: location.into(),
            center,
            radius_miles,
        }
    }

    /// Resolve `location` to a center with the client's geocoder.
    #[cfg(feature = "http")]
    pub async fn geocoded(
        client: &crate::OverpassClient,
        location: impl Into<String>,
        radius_miles: f64,
    ) -> Result<Self> {
        let location = location.into();
        let center = client.geocode(&location).await?;
        Ok(Self::new(location, center, radius_miles))
    }

    fn validate(&self) -> Result<()> {
        if !self.center.is_valid() {
            return Err(PoiError::InvalidConfig(format!(
                "center ({}, {}) is not a valid coordinate",
                self.center.latitude, self.center.longitude
            )));
        }
        check_distance("radius_miles", self.radius_miles)
    }
}

/// Result of querying one category.
#[derive(Debug)]
pub struct CategoryFetch {
    pub category: Category,
    pub result: Result<Vec<RawCandidate>>,
}

impl CategoryFetch {
    pub fn ok(category: Category, candidates: Vec<RawCandidate>) -> Self {
        Self {
            category,
            result: Ok(candidates),
        }
    }

    pub fn failed(category: Category, error: PoiError) -> Self {
        Self {
            category,
            result: Err(error),
        }
    }
}

/// A request together with its fetch results, for batch analysis.
#[derive(Debug)]
pub struct AnalysisJob {
    pub request: AnalysisRequest,
    pub fetches: Vec<CategoryFetch>,
}

/// Extract POIs from every successful fetch, in fetch order.
///
/// Failed fetches are logged and skipped. Records without a usable centroid
/// or outside the search radius are dropped.
pub fn collect_pois(request: &AnalysisRequest, fetches: &[CategoryFetch]) -> Vec<Poi> {
    let mut pois = Vec::new();
    for fetch in fetches {
        match &fetch.result {
            Ok(candidates) => pois.extend(
                candidates
                    .iter()
                    .filter_map(|c| c.to_poi(fetch.category, &request.center, request.radius_miles)),
            ),
            Err(e) => warn!(
                "[PoiAnalysis] Category {} failed for {}: {}",
                fetch.category, request.location, e
            ),
        }
    }
    pois
}

/// Run the full pipeline for one property.
///
/// # Errors
///
/// Returns [`PoiError::InvalidConfig`] when the configuration, the center or
/// the radius is invalid. Failed category fetches are not errors.
pub fn analyze(
    request: &AnalysisRequest,
    fetches: &[CategoryFetch],
    config: &AnalysisConfig,
) -> Result<PoiReport> {
    config.validate()?;
    request.validate()?;

    let start = Instant::now();

    let failed_categories: Vec<Category> = fetches
        .iter()
        .filter(|f| f.result.is_err())
        .map(|f| f.category)
        .collect();

    let pois = collect_pois(request, fetches);
    let extracted = pois.len();

    let merged = deduplicate(&pois, config.merge_threshold_miles);
    let after_dedup = merged.len();

    let kept = cap_per_category(merged, config.max_per_category);
    let clusters = assign_clusters(&kept, &config.singleton_categories, config.cluster_radius_miles);

    info!(
        "[PoiAnalysis] {}: {} candidates -> {} merged -> {} kept, {} cluster categories, {} failed categories in {:?}",
        request.location,
        extracted,
        after_dedup,
        kept.len(),
        clusters.len(),
        failed_categories.len(),
        start.elapsed()
    );

    Ok(PoiReport {
        location: request.location.clone(),
        center: request.center,
        radius_miles: request.radius_miles,
        pois: kept,
        clusters,
        failed_categories,
    })
}

/// Analyze several independent properties sequentially.
pub fn analyze_batch(jobs: &[AnalysisJob], config: &AnalysisConfig) -> Vec<Result<PoiReport>> {
    info!("[PoiAnalysis] Analyzing batch of {} properties", jobs.len());
    jobs.iter()
        .map(|job| analyze(&job.request, &job.fetches, config))
        .collect()
}

/// Analyze several independent properties in parallel.
///
/// Same results as [`analyze_batch`], in the same order. Each property is
/// still processed on a single thread.
#[cfg(feature = "parallel")]
pub fn analyze_batch_parallel(jobs: &[AnalysisJob], config: &AnalysisConfig) -> Vec<Result<PoiReport>> {
    use rayon::prelude::*;

    info!(
        "[PoiAnalysis] Analyzing batch of {} properties (parallel)",
        jobs.len()
    );
    jobs.par_iter()
        .map(|job| analyze(&job.request, &job.fetches, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AnalysisRequest {
        AnalysisRequest::new("127 West Lane", GeoPoint::new(41.2811, -73.4985), 1.0)
    }

    fn fetches() -> Vec<CategoryFetch> {
        vec![
            CategoryFetch::ok(
                Category::Supermarket,
                vec![RawCandidate::at(41.2830, -73.4990).with_tag("name", "Village Market")],
            ),
            CategoryFetch::ok(
                Category::Pharmacy,
                vec![RawCandidate::at(41.28301, -73.49901).with_tag("name", "Village Pharmacy")],
            ),
            CategoryFetch::failed(Category::Park, PoiError::Status(504)),
            CategoryFetch::ok(
                Category::Parking,
                vec![
                    RawCandidate::at(41.2800, -73.4970),
                    RawCandidate::at(41.2802, -73.4972),
                    RawCandidate::at(41.2804, -73.4974),
                ],
            ),
            CategoryFetch::ok(
                Category::Quarry,
                // ~4 miles away, outside the radius
                vec![RawCandidate::at(41.34, -73.4985).with_tag("name", "Far Quarry")],
            ),
        ]
    }

    #[test]
    fn test_collect_skips_failed_categories() {
        let pois = collect_pois(&request(), &fetches());
        assert_eq!(pois.len(), 5);
        assert!(pois.iter().all(|p| p.category != Category::Park));
        assert!(pois.iter().all(|p| p.category != Category::Quarry));
    }

    #[test]
    fn test_analyze_pipeline() {
        let report = analyze(&request(), &fetches(), &AnalysisConfig::default()).unwrap();

        assert_eq!(report.location, "127 West Lane");
        assert_eq!(report.failed_categories, vec![Category::Park]);

        // Market and pharmacy share a building; neighbouring parking lots are ~28m apart
        let market = report
            .pois
            .iter()
            .find(|p| p.has_category(Category::Supermarket))
            .unwrap();
        assert_eq!(market.categories, vec![Category::Pharmacy, Category::Supermarket]);

        assert_eq!(report.clusters.len(), 1);
        assert_eq!(report.clusters[&Category::Parking].len(), 1);
    }

    #[test]
    fn test_all_categories_failed_gives_empty_report() {
        let fetches = vec![
            CategoryFetch::failed(Category::Park, PoiError::RateLimited { attempts: 4 }),
            CategoryFetch::failed(Category::School, PoiError::Status(500)),
        ];
        let report = analyze(&request(), &fetches, &AnalysisConfig::default()).unwrap();
        assert!(report.is_empty());
        assert!(report.clusters.is_empty());
        assert_eq!(report.failed_categories.len(), 2);
    }

    #[test]
    fn test_invalid_request_rejected() {
        let config = AnalysisConfig::default();

        let mut bad_center = request();
        bad_center.center = GeoPoint::new(120.0, 0.0);
        assert!(matches!(
            analyze(&bad_center, &[], &config),
            Err(PoiError::InvalidConfig(_))
        ));

        let mut bad_radius = request();
        bad_radius.radius_miles = -2.0;
        assert!(analyze(&bad_radius, &[], &config).is_err());
    }

    #[test]
    fn test_cap_applies_before_clustering() {
        let config = AnalysisConfig {
            max_per_category: 1,
            ..Default::default()
        };
        let report = analyze(&request(), &fetches(), &config).unwrap();
        let parking = report
            .pois
            .iter()
            .filter(|p| p.poi.category == Category::Parking)
            .count();
        assert_eq!(parking, 1);
    }

    #[test]
    fn test_batch_keeps_order() {
        let jobs = vec![
            AnalysisJob {
                request: request(),
                fetches: fetches(),
            },
            AnalysisJob {
                request: AnalysisRequest::new("Nowhere", GeoPoint::new(f64::NAN, 0.0), 1.0),
                fetches: vec![],
            },
        ];
        let results = analyze_batch(&jobs, &AnalysisConfig::default());
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_batch_matches_sequential() {
        let make_jobs = || {
            (0..8)
                .map(|i| AnalysisJob {
                    request: AnalysisRequest::new(
                        format!("Lot {}", i),
                        GeoPoint::new(41.2811, -73.4985),
                        1.0,
                    ),
                    fetches: fetches(),
                })
                .collect::<Vec<_>>()
        };
        let config = AnalysisConfig::default();
        let sequential: Vec<PoiReport> = analyze_batch(&make_jobs(), &config)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        let parallel: Vec<PoiReport> = analyze_batch_parallel(&make_jobs(), &config)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(sequential, parallel);
    }
}
