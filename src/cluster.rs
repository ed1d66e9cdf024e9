//! Cluster representatives for singleton categories, and map markers.
//!
//! Some categories (parking lots, bus stops, residential areas, highway
//! segments) produce many points close together and would swamp a map.
//! For those, points are grouped greedily: the first point of a category
//! becomes a representative, and every later point joins the first
//! representative within the cluster radius or becomes a new one.
//!
//! The grouping depends on input order and is not an optimal partition.
//! The map only needs one readable marker per spatial cluster.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::geo_utils::miles_to_meters;
use crate::index::ProximityIndex;
use crate::{Category, GeoPoint, MarkerStyle, MergedPoi, Polarity};

/// A representative point and the input points assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub category: Category,
    pub representative: GeoPoint,
    /// Indices into the input slice, in processing order
    pub members: Vec<usize>,
}

/// One marker to draw on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub coordinates: GeoPoint,
    pub category: Category,
    pub polarity: Polarity,
    pub label: String,
    /// Points represented by this marker (1 unless clustered)
    pub member_count: usize,
    #[serde(flatten)]
    pub style: MarkerStyle,
}

/// Greedy cluster assignment, keeping membership.
///
/// A merged point takes part once for each of its categories that is a
/// singleton category. Categories outside `singleton_categories` are absent
/// from the result.
pub fn cluster_members(
    points: &[MergedPoi],
    singleton_categories: &BTreeSet<Category>,
    cluster_radius_miles: f64,
) -> BTreeMap<Category, Vec<Cluster>> {
    // NaN and negative radii collapse to 0; +inf puts everything in one cluster
    let radius_meters = if cluster_radius_miles >= 0.0 {
        miles_to_meters(cluster_radius_miles)
    } else {
        0.0
    };

    let mut state: BTreeMap<Category, (ProximityIndex, Vec<Cluster>)> = BTreeMap::new();

    for (i, point) in points.iter().enumerate() {
        let coordinates = point.poi.coordinates;
        for &category in point.categories.iter().filter(|c| singleton_categories.contains(c)) {
            let (index, clusters) = state
                .entry(category)
                .or_insert_with(|| (ProximityIndex::new(), Vec::new()));

            match index.first_within(&coordinates, radius_meters) {
                Some(idx) => clusters[idx].members.push(i),
                None => {
                    index.insert(coordinates);
                    clusters.push(Cluster {
                        category,
                        representative: coordinates,
                        members: vec![i],
                    });
                }
            }
        }
    }

    state
        .into_iter()
        .map(|(category, (_, clusters))| (category, clusters))
        .collect()
}

/// Representative coordinates per singleton category, in the order they
/// were created.
///
/// # Example
/// ```
/// use poi_proximity::{Category, GeoPoint, MergedPoi, Poi, assign_clusters};
/// use std::collections::BTreeSet;
///
/// let center = GeoPoint::new(0.0, 0.0);
/// let lots: Vec<MergedPoi> = (0..30)
///     .map(|i| {
///         let at = GeoPoint::new(0.01 + i as f64 * 0.00004, 0.0);
///         MergedPoi::from_poi(Poi::new("Lot", Category::Parking, at, &center))
///     })
///     .collect();
///
/// let singletons = BTreeSet::from([Category::Parking]);
/// let clusters = assign_clusters(&lots, &singletons, 0.25);
/// assert_eq!(clusters[&Category::Parking].len(), 1);
/// ```
pub fn assign_clusters(
    points: &[MergedPoi],
    singleton_categories: &BTreeSet<Category>,
    cluster_radius_miles: f64,
) -> BTreeMap<Category, Vec<GeoPoint>> {
    cluster_members(points, singleton_categories, cluster_radius_miles)
        .into_iter()
        .map(|(category, clusters)| {
            let representatives = clusters.into_iter().map(|c| c.representative).collect();
            (category, representatives)
        })
        .collect()
}

/// Markers for a map: one per point for ordinary categories, one per
/// representative for singleton categories.
///
/// A merged point is drawn individually under its primary category, or
/// under its first non-singleton category when the primary one is a
/// singleton category. Points with only singleton categories appear only
/// through their representatives.
pub fn build_markers(
    points: &[MergedPoi],
    singleton_categories: &BTreeSet<Category>,
    cluster_radius_miles: f64,
) -> Vec<Marker> {
    let mut markers: Vec<Marker> = points
        .iter()
        .filter_map(|point| {
            let category = std::iter::once(&point.poi.category)
                .chain(point.categories.iter())
                .find(|c| !singleton_categories.contains(c))?;
            Some(Marker {
                coordinates: point.poi.coordinates,
                category: *category,
                polarity: category.polarity(),
                label: point.poi.name.clone(),
                member_count: 1,
                style: category.marker_style(),
            })
        })
        .collect();

    let clusters = cluster_members(points, singleton_categories, cluster_radius_miles);
    for cluster in clusters.into_values().flatten() {
        let label = match cluster.members.as_slice() {
            [only] => points
                .get(*only)
                .map(|p| p.poi.name.clone())
                .unwrap_or_else(|| cluster.category.display_name()),
            members => format!("{} ({})", cluster.category.display_name(), members.len()),
        };
        markers.push(Marker {
            coordinates: cluster.representative,
            category: cluster.category,
            polarity: cluster.category.polarity(),
            label,
            member_count: cluster.members.len(),
            style: cluster.category.marker_style(),
        });
    }

    markers
}
