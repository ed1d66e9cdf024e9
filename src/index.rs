//! R-tree backed "first point within distance" lookups.
//!
//! Deduplication and clustering both need the same query: among the points
//! stored so far, which is the earliest one within a given great-circle
//! distance? The R-tree narrows the candidates to a degree envelope; the
//! haversine check and the lowest insertion index decide. Results are
//! identical to a linear scan over the stored points.

use rstar::{RTree, RTreeObject, AABB};

use crate::geo_utils::{haversine_distance, search_padding_degrees};
use crate::GeoPoint;

/// A stored point with its insertion index
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    idx: usize,
    lat: f64,
    lng: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lng, self.lat])
    }
}

pub(crate) struct ProximityIndex {
    tree: RTree<IndexedPoint>,
    points: Vec<GeoPoint>,
}

impl ProximityIndex {
    pub(crate) fn new() -> Self {
        Self {
            tree: RTree::new(),
            points: Vec::new(),
        }
    }

    /// Store a point and return its index.
    pub(crate) fn insert(&mut self, point: GeoPoint) -> usize {
        let idx = self.points.len();
        self.points.push(point);
        // Invalid points never satisfy a distance check; keep them out of the tree
        if point.is_valid() {
            self.tree.insert(IndexedPoint {
                idx,
                lat: point.latitude,
                lng: point.longitude,
            });
        }
        idx
    }

    /// Index of the earliest stored point within `meters` of `point`.
    pub(crate) fn first_within(&self, point: &GeoPoint, meters: f64) -> Option<usize> {
        match search_envelope(point, meters) {
            Some(envelope) => self
                .tree
                .locate_in_envelope_intersecting(&envelope)
                .filter(|candidate| haversine_distance(point, &self.points[candidate.idx]) <= meters)
                .map(|candidate| candidate.idx)
                .min(),
            None => self
                .points
                .iter()
                .position(|stored| haversine_distance(point, stored) <= meters),
        }
    }
}

/// Envelope around `point` containing the whole radius, or `None` when it
/// would wrap a pole or the antimeridian.
fn search_envelope(point: &GeoPoint, meters: f64) -> Option<AABB<[f64; 2]>> {
    if !point.is_valid() {
        return None;
    }
    let (lat_pad, lng_pad) = search_padding_degrees(meters, point.latitude)?;

    let min_lng = point.longitude - lng_pad;
    let max_lng = point.longitude + lng_pad;
    if min_lng < -180.0 || max_lng > 180.0 {
        return None;
    }

    Some(AABB::from_corners(
        [min_lng, point.latitude - lat_pad],
        [max_lng, point.latitude + lat_pad],
    ))
}
