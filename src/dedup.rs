//! Proximity deduplication of POIs.
//!
//! The same physical place often answers several category queries (a
//! supermarket that is also a pharmacy, a park polygon that also carries a
//! playground). Deduplication folds such points into one [`MergedPoi`].
//!
//! ## Algorithm
//! 1. Order POIs by ascending distance from the center (stable)
//! 2. Walk them in that order, keeping a growing list of merged records
//! 3. A POI within the threshold of an existing record folds into the
//!    *earliest* such record, never the nearest one
//! 4. Otherwise it starts a new record
//!
//! A record's coordinates are those of its first (closest) member and never
//! move. Only an empty name or address may be backfilled by later members.

use log::debug;
use std::collections::{BTreeSet, HashMap};

use crate::geo_utils::miles_to_meters;
use crate::index::ProximityIndex;
use crate::{Category, MergedPoi, Poi, Polarity};

/// Merged record under construction
struct MergeBuilder {
    poi: Poi,
    categories: BTreeSet<Category>,
    types: BTreeSet<Polarity>,
}

impl MergeBuilder {
    fn new(poi: Poi) -> Self {
        let categories = BTreeSet::from([poi.category]);
        let types = BTreeSet::from([poi.polarity]);
        Self { poi, categories, types }
    }

    fn absorb(&mut self, other: &Poi) {
        self.categories.insert(other.category);
        self.types.insert(other.polarity);
        if self.poi.name.is_empty() && !other.name.is_empty() {
            self.poi.name = other.name.clone();
        }
        if self.poi.address.is_empty() && !other.address.is_empty() {
            self.poi.address = other.address.clone();
        }
    }

    fn finish(self) -> MergedPoi {
        MergedPoi {
            poi: self.poi,
            categories: self.categories.into_iter().collect(),
            types: self.types.into_iter().collect(),
        }
    }
}

/// Merge POIs lying within `threshold_miles` of each other.
///
/// Negative or NaN thresholds are treated as 0, which merges exact
/// coincidences only. An infinite threshold merges everything. Output follows processing order (closest first).
///
/// # Example
/// ```
/// use poi_proximity::{Category, GeoPoint, Poi, deduplicate};
///
/// let center = GeoPoint::new(0.0, 0.0);
/// let pois = vec![
///     Poi::new("A", Category::Park, GeoPoint::new(0.0, 0.0), &center),
///     Poi::new("B", Category::Park, GeoPoint::new(0.0001, 0.0001), &center),
///     Poi::new("C", Category::School, GeoPoint::new(1.0, 1.0), &center),
/// ];
///
/// let merged = deduplicate(&pois, 0.05);
/// assert_eq!(merged.len(), 2);
/// assert_eq!(merged[0].poi.name, "A");
/// assert_eq!(merged[1].categories, vec![Category::School]);
/// ```
pub fn deduplicate(points: &[Poi], threshold_miles: f64) -> Vec<MergedPoi> {
    // NaN fails the comparison; +inf merges everything
    let threshold_meters = if threshold_miles >= 0.0 {
        miles_to_meters(threshold_miles)
    } else {
        0.0
    };

    let mut ordered: Vec<&Poi> = points.iter().collect();
    ordered.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));

    let mut index = ProximityIndex::new();
    let mut merged: Vec<MergeBuilder> = Vec::new();

    for poi in ordered {
        match index.first_within(&poi.coordinates, threshold_meters) {
            Some(idx) => merged[idx].absorb(poi),
            None => {
                index.insert(poi.coordinates);
                merged.push(MergeBuilder::new(poi.clone()));
            }
        }
    }

    debug!(
        "[Dedup] {} POIs -> {} merged records (threshold {:.1}m)",
        points.len(),
        merged.len(),
        threshold_meters
    );

    merged.into_iter().map(MergeBuilder::finish).collect()
}

/// Keep at most `max_per_category` records per primary category.
///
/// Records are ordered by (polarity, category, distance) and the closest
/// ones per category survive. This is lossy: dropped records are discarded,
/// not merged. The returned list keeps that ordering.
pub fn cap_per_category(mut points: Vec<MergedPoi>, max_per_category: usize) -> Vec<MergedPoi> {
    points.sort_by(|a, b| {
        a.poi
            .polarity
            .cmp(&b.poi.polarity)
            .then(a.poi.category.cmp(&b.poi.category))
            .then(a.poi.distance_miles.total_cmp(&b.poi.distance_miles))
    });

    let total = points.len();
    let mut seen: HashMap<Category, usize> = HashMap::new();
    let kept: Vec<MergedPoi> = points
        .into_iter()
        .filter(|p| {
            let count = seen.entry(p.poi.category).or_insert(0);
            *count += 1;
            *count <= max_per_category
        })
        .collect();

    if kept.len() < total {
        debug!(
            "[Dedup] Per-category cap of {} dropped {} records",
            max_per_category,
            total - kept.len()
        );
    }

    kept
}
