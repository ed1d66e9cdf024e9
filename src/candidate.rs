//! Raw upstream records and their conversion into [`Poi`]s.
//!
//! Upstream records are loosely typed: any tag may be missing or blank and
//! the geometry may be a point, a polygon, or nothing usable at all. Display
//! fields are resolved through ordered extractor lists; the first extractor
//! returning a non-empty value wins.

use geo::{Centroid, Geometry, Point};
use log::debug;
use std::collections::BTreeMap;

use crate::geo_utils::within_radius;
use crate::{Category, GeoPoint, Poi};

/// Fallback when neither structured fields nor coordinates give an address.
pub const ADDRESS_NOT_AVAILABLE: &str = "address not available";

/// One record returned by a category query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawCandidate {
    /// Feature geometry (node, way or relation shape)
    pub geometry: Option<Geometry<f64>>,
    pub osm_id: Option<u64>,
    /// Raw OpenStreetMap tags (`name`, `brand`, `addr:*`, ...)
    pub tags: BTreeMap<String, String>,
}

impl RawCandidate {
    pub fn new(geometry: Option<Geometry<f64>>) -> Self {
        Self {
            geometry,
            ..Default::default()
        }
    }

    /// A candidate with point geometry.
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::new(Some(Geometry::Point(Point::new(longitude, latitude))))
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_osm_id(mut self, osm_id: u64) -> Self {
        self.osm_id = Some(osm_id);
        self
    }

    /// Trimmed tag value, `None` when missing or blank.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Centroid of the geometry, `None` for missing, empty or non-finite shapes.
    pub fn centroid(&self) -> Option<GeoPoint> {
        let point = self.geometry.as_ref()?.centroid()?;
        let centroid = GeoPoint::new(point.y(), point.x());
        centroid.is_valid().then_some(centroid)
    }

    /// Display name: `name`, then `brand`, then the category label.
    pub fn resolve_name(&self, category: Category) -> String {
        first_present(NAME_EXTRACTORS, self).unwrap_or_else(|| category.as_str().to_string())
    }

    /// Address: full address tag, then assembled `addr:*` parts, then
    /// `"lat, lon"`, then [`ADDRESS_NOT_AVAILABLE`].
    pub fn resolve_address(&self) -> String {
        first_present(ADDRESS_EXTRACTORS, self).unwrap_or_else(|| ADDRESS_NOT_AVAILABLE.to_string())
    }

    /// Build a POI for `category` if the record has a usable centroid within
    /// `radius_miles` of `center`.
    ///
    /// Records with malformed geometry are skipped, not reported as errors.
    pub fn to_poi(&self, category: Category, center: &GeoPoint, radius_miles: f64) -> Option<Poi> {
        let Some(coordinates) = self.centroid() else {
            debug!(
                "[RawCandidate] Skipping {} {:?}: no usable centroid",
                category, self.osm_id
            );
            return None;
        };

        if !within_radius(center, &coordinates, radius_miles) {
            return None;
        }

        let mut poi = Poi::new(self.resolve_name(category), category, coordinates, center)
            .with_address(self.resolve_address());
        poi.brand = self.tag("brand").map(str::to_string);
        poi.osm_id = self.osm_id;
        Some(poi)
    }
}

// ============================================================================
// Extractors
// ============================================================================

type Extractor = fn(&RawCandidate) -> Option<String>;

const NAME_EXTRACTORS: &[Extractor] = &[name_tag, brand_tag];

const ADDRESS_EXTRACTORS: &[Extractor] = &[full_address, assembled_address, coordinate_address];

fn first_present(extractors: &[Extractor], candidate: &RawCandidate) -> Option<String> {
    extractors.iter().find_map(|extract| extract(candidate))
}

fn name_tag(candidate: &RawCandidate) -> Option<String> {
    candidate.tag("name").map(str::to_string)
}

fn brand_tag(candidate: &RawCandidate) -> Option<String> {
    candidate.tag("brand").map(str::to_string)
}

fn full_address(candidate: &RawCandidate) -> Option<String> {
    candidate.tag("addr:full").map(str::to_string)
}

/// "127 West Lane, Ridgefield 06877" from whichever parts are present.
fn assembled_address(candidate: &RawCandidate) -> Option<String> {
    let street_line = join_tags(candidate, &["addr:housenumber", "addr:street"]);
    let locality = join_tags(candidate, &["addr:city", "addr:postcode"]);

    let address = [street_line, locality]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    (!address.is_empty()).then_some(address)
}

fn join_tags(candidate: &RawCandidate, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| candidate.tag(key))
        .collect::<Vec<_>>()
        .join(" ")
}

fn coordinate_address(candidate: &RawCandidate) -> Option<String> {
    candidate
        .centroid()
        .map(|c| format!("{:.6}, {:.6}", c.latitude, c.longitude))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn center() -> GeoPoint {
        GeoPoint::new(41.2811, -73.4985)
    }

    #[test]
    fn test_name_fallback_chain() {
        let named = RawCandidate::at(41.28, -73.50)
            .with_tag("name", "  Ridgefield Library ")
            .with_tag("brand", "Ignored");
        assert_eq!(named.resolve_name(Category::Library), "Ridgefield Library");

        let branded = RawCandidate::at(41.28, -73.50)
            .with_tag("name", "   ")
            .with_tag("brand", "Shell");
        assert_eq!(branded.resolve_name(Category::Fuel), "Shell");

        let anonymous = RawCandidate::at(41.28, -73.50);
        assert_eq!(anonymous.resolve_name(Category::BusStop), "bus_stop");
    }

    #[test]
    fn test_address_fallback_chain() {
        let full = RawCandidate::at(41.28, -73.50)
            .with_tag("addr:full", "1 Main St, Ridgefield, CT")
            .with_tag("addr:street", "Ignored");
        assert_eq!(full.resolve_address(), "1 Main St, Ridgefield, CT");

        let parts = RawCandidate::at(41.28, -73.50)
            .with_tag("addr:housenumber", "127")
            .with_tag("addr:street", "West Lane")
            .with_tag("addr:city", "Ridgefield")
            .with_tag("addr:postcode", "06877");
        assert_eq!(parts.resolve_address(), "127 West Lane, Ridgefield 06877");

        let city_only = RawCandidate::at(41.28, -73.50).with_tag("addr:city", "Ridgefield");
        assert_eq!(city_only.resolve_address(), "Ridgefield");

        let bare = RawCandidate::at(41.28, -73.5);
        assert_eq!(bare.resolve_address(), "41.280000, -73.500000");

        let nowhere = RawCandidate::new(None);
        assert_eq!(nowhere.resolve_address(), ADDRESS_NOT_AVAILABLE);
    }

    #[test]
    fn test_polygon_centroid() {
        let square = polygon![
            (x: -73.501, y: 41.281),
            (x: -73.499, y: 41.281),
            (x: -73.499, y: 41.283),
            (x: -73.501, y: 41.283),
            (x: -73.501, y: 41.281),
        ];
        let candidate = RawCandidate::new(Some(Geometry::Polygon(square)));
        let centroid = candidate.centroid().unwrap();
        assert!((centroid.latitude - 41.282).abs() < 1e-9);
        assert!((centroid.longitude - -73.5).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_geometry_is_skipped() {
        let empty = RawCandidate::new(Some(Geometry::MultiPolygon(MultiPolygon::new(vec![]))));
        assert!(empty.centroid().is_none());
        assert!(empty.to_poi(Category::Park, &center(), 3.0).is_none());

        let nan = RawCandidate::at(f64::NAN, -73.5);
        assert!(nan.to_poi(Category::Park, &center(), 3.0).is_none());

        let missing = RawCandidate::new(None);
        assert!(missing.to_poi(Category::Park, &center(), 3.0).is_none());
    }

    #[test]
    fn test_to_poi_filters_radius() {
        // ~0.69 miles north of the center
        let near = RawCandidate::at(41.2911, -73.4985).with_tag("name", "North Park");
        let poi = near.to_poi(Category::Park, &center(), 1.0).unwrap();
        assert_eq!(poi.name, "North Park");
        assert_eq!(poi.distance_miles, 0.691);
        assert_eq!(poi.address, "41.291100, -73.498500");

        assert!(near.to_poi(Category::Park, &center(), 0.5).is_none());
    }

    #[test]
    fn test_to_poi_carries_identity() {
        let candidate = RawCandidate::at(41.2815, -73.4990)
            .with_osm_id(123_456)
            .with_tag("brand", "Citgo");
        let poi = candidate.to_poi(Category::Fuel, &center(), 1.0).unwrap();
        assert_eq!(poi.name, "Citgo");
        assert_eq!(poi.brand.as_deref(), Some("Citgo"));
        assert_eq!(poi.osm_id, Some(123_456));
        assert_eq!(poi.polarity, crate::Polarity::Positive);
    }
}
