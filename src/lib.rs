//! # POI Proximity
//!
//! Deduplication and clustering of points of interest found around a property.
//!
//! This library provides:
//! - Name and address resolution from loosely-typed upstream records
//! - Proximity deduplication: places found by several category queries collapse into one record
//! - Greedy cluster representatives for categories that would crowd a map
//! - JSON reports and summary payloads for a presentation layer
//!
//! ## Features
//!
//! - **`parallel`** - Analyze independent center points in parallel with rayon
//! - **`http`** - Enable the Overpass API client for fetching candidates
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use poi_proximity::{AnalysisConfig, Category, GeoPoint, Poi, deduplicate};
//!
//! let property = GeoPoint::new(41.2811, -73.4985);
//!
//! // The same building answered two category queries
//! let pois = vec![
//!     Poi::new("Town Library", Category::Library, GeoPoint::new(41.28200, -73.49800), &property),
//!     Poi::new("Reading Room Cafe", Category::Cafe, GeoPoint::new(41.28205, -73.49801), &property),
//! ];
//!
//! let config = AnalysisConfig::default();
//! let merged = deduplicate(&pois, config.merge_threshold_miles);
//!
//! assert_eq!(merged.len(), 1);
//! assert_eq!(merged[0].categories, vec![Category::Cafe, Category::Library]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub mod analysis;
pub mod candidate;
pub mod category;
pub mod cluster;
pub mod dedup;
pub mod error;
pub mod geo_utils;
mod index;
pub mod report;

// Overpass client for candidate fetching
#[cfg(feature = "http")]
pub mod http;

pub use analysis::{analyze, analyze_batch, collect_pois, AnalysisJob, AnalysisRequest, CategoryFetch};
#[cfg(feature = "parallel")]
pub use analysis::analyze_batch_parallel;
pub use candidate::RawCandidate;
pub use category::{Category, MarkerStyle, Polarity, TagFilter};
pub use cluster::{assign_clusters, build_markers, cluster_members, Cluster, Marker};
pub use dedup::{cap_per_category, deduplicate};
pub use error::{PoiError, Result};
pub use report::{PoiReport, SummaryPayload};

#[cfg(feature = "http")]
pub use http::{fetch_categories_sync, FetchConfig, OverpassClient};

// ============================================================================
// Core Types
// ============================================================================

/// A coordinate in decimal degrees.
///
/// Serialized as a `[latitude, longitude]` pair.
///
/// # Example
/// ```
/// use poi_proximity::GeoPoint;
/// let point = GeoPoint::new(41.2811, -73.4985);
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.latitude, point.longitude]
    }
}

/// A categorized point of interest near the subject property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    /// Display name (falls back to brand, then category label)
    pub name: String,
    pub category: Category,
    /// Static classification of the category
    #[serde(rename = "type")]
    pub polarity: Polarity,
    pub coordinates: GeoPoint,
    /// Great-circle distance from the center, rounded to 0.001 miles
    pub distance_miles: f64,
    /// Best-effort address or a fallback string
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm_id: Option<u64>,
}

impl Poi {
    /// Create a POI, computing its distance from `center`.
    ///
    /// The distance is always derived from the coordinates here, never
    /// taken from upstream.
    pub fn new(name: impl Into<String>, category: Category, coordinates: GeoPoint, center: &GeoPoint) -> Self {
        let distance_miles = geo_utils::round_miles(geo_utils::haversine_miles(center, &coordinates));
        Self {
            name: name.into(),
            category,
            polarity: category.polarity(),
            coordinates,
            distance_miles,
            address: String::new(),
            brand: None,
            osm_id: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_osm_id(mut self, osm_id: u64) -> Self {
        self.osm_id = Some(osm_id);
        self
    }
}

/// A POI after proximity deduplication.
///
/// `poi` holds the closest member; its coordinates never move when later
/// members are folded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedPoi {
    #[serde(flatten)]
    pub poi: Poi,
    /// Every category merged into this record, sorted
    pub categories: Vec<Category>,
    /// Every polarity merged into this record, sorted
    pub types: Vec<Polarity>,
}

impl MergedPoi {
    /// Wrap a single POI as its own merged record.
    pub fn from_poi(poi: Poi) -> Self {
        let categories = vec![poi.category];
        let types = vec![poi.polarity];
        Self { poi, categories, types }
    }

    pub fn has_category(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    pub fn has_polarity(&self, polarity: Polarity) -> bool {
        self.types.contains(&polarity)
    }
}

/// Merge threshold of the analyzer, in meters.
pub const DEFAULT_MERGE_THRESHOLD_METERS: f64 = 40.0;

/// Default cap on POIs kept per category.
pub const DEFAULT_MAX_PER_CATEGORY: usize = 25;

/// Default radius of a singleton-category cluster, in miles.
pub const DEFAULT_CLUSTER_RADIUS_MILES: f64 = 0.25;

/// Configuration for a POI analysis run.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use poi_proximity::AnalysisConfig;
///
/// let config: AnalysisConfig = serde_json::from_str(r#"{"max_per_category": 10}"#).unwrap();
/// assert_eq!(config.max_per_category, 10);
/// assert_eq!(config.cluster_radius_miles, 0.25);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Points within this distance of an earlier point are merged into it.
    /// Default: 40 meters (~0.0249 miles)
    pub merge_threshold_miles: f64,

    /// Maximum POIs kept per category after deduplication. Points beyond
    /// the cap are dropped, not merged.
    /// Default: 25
    pub max_per_category: usize,

    /// Radius within which singleton-category points share one marker.
    /// Default: 0.25 miles
    pub cluster_radius_miles: f64,

    /// Categories drawn as one marker per spatial cluster.
    /// Default: parking, bus stops, residential areas, highways
    pub singleton_categories: BTreeSet<Category>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            merge_threshold_miles: geo_utils::meters_to_miles(DEFAULT_MERGE_THRESHOLD_METERS),
            max_per_category: DEFAULT_MAX_PER_CATEGORY,
            cluster_radius_miles: DEFAULT_CLUSTER_RADIUS_MILES,
            singleton_categories: [
                Category::Parking,
                Category::BusStop,
                Category::Residential,
                Category::Highway,
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl AnalysisConfig {
    /// Check that distances are finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`PoiError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        check_distance("merge_threshold_miles", self.merge_threshold_miles)?;
        check_distance("cluster_radius_miles", self.cluster_radius_miles)
    }

    pub fn is_singleton(&self, category: Category) -> bool {
        self.singleton_categories.contains(&category)
    }
}

pub(crate) fn check_distance(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PoiError::InvalidConfig(format!(
            "{} must be a finite, non-negative distance (got {})",
            field, value
        )))
    }
}

// ============================================================================
// Tests
// ============================================================================
