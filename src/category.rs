//! POI categories, their polarity and how they are looked up.
//!
//! Each [`Category`] maps to exactly one OpenStreetMap tag filter and one
//! map marker style. Polarity is static: a category is either desirable
//! near a property or it is not.

use serde::{Deserialize, Serialize};

use crate::PoiError;

/// Whether a category is desirable near the subject property.
///
/// Ordering is `Negative < Positive`, which matches the alphabetical order
/// of the serialized labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Negative,
    Positive,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Negative => "negative",
            Polarity::Positive => "positive",
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A tag category queried around the subject property.
///
/// Variants are declared alphabetically so the derived ordering matches
/// the ordering of their labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Bank,
    BusStop,
    Cafe,
    Clinic,
    Construction,
    Fuel,
    Highway,
    Hospital,
    Industrial,
    Landfill,
    Library,
    NoiseBarrier,
    Park,
    Parking,
    Pharmacy,
    PlaceOfWorship,
    Playground,
    PowerStation,
    Quarry,
    Railway,
    Residential,
    Restaurant,
    School,
    SportsCentre,
    Supermarket,
    TransitStation,
    University,
    WasteDisposal,
}

impl Category {
    /// Every category in query order: positive categories first, then negative.
    pub const ALL: [Category; 28] = [
        Category::Park,
        Category::School,
        Category::University,
        Category::Hospital,
        Category::Clinic,
        Category::TransitStation,
        Category::BusStop,
        Category::Supermarket,
        Category::Pharmacy,
        Category::Library,
        Category::Restaurant,
        Category::Cafe,
        Category::Bank,
        Category::Playground,
        Category::SportsCentre,
        Category::PlaceOfWorship,
        Category::Parking,
        Category::Fuel,
        Category::Railway,
        Category::Residential,
        Category::Industrial,
        Category::Construction,
        Category::Landfill,
        Category::Highway,
        Category::WasteDisposal,
        Category::Quarry,
        Category::PowerStation,
        Category::NoiseBarrier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bank => "bank",
            Category::BusStop => "bus_stop",
            Category::Cafe => "cafe",
            Category::Clinic => "clinic",
            Category::Construction => "construction",
            Category::Fuel => "fuel",
            Category::Highway => "highway",
            Category::Hospital => "hospital",
            Category::Industrial => "industrial",
            Category::Landfill => "landfill",
            Category::Library => "library",
            Category::NoiseBarrier => "noise_barrier",
            Category::Park => "park",
            Category::Parking => "parking",
            Category::Pharmacy => "pharmacy",
            Category::PlaceOfWorship => "place_of_worship",
            Category::Playground => "playground",
            Category::PowerStation => "power_station",
            Category::Quarry => "quarry",
            Category::Railway => "railway",
            Category::Residential => "residential",
            Category::Restaurant => "restaurant",
            Category::School => "school",
            Category::SportsCentre => "sports_centre",
            Category::Supermarket => "supermarket",
            Category::TransitStation => "transit_station",
            Category::University => "university",
            Category::WasteDisposal => "waste_disposal",
        }
    }

    /// Human-readable label, e.g. "place of worship".
    pub fn display_name(&self) -> String {
        self.as_str().replace('_', " ")
    }

    pub fn polarity(&self) -> Polarity {
        match self {
            Category::Industrial
            | Category::Construction
            | Category::Landfill
            | Category::Highway
            | Category::WasteDisposal
            | Category::Quarry
            | Category::PowerStation
            | Category::NoiseBarrier => Polarity::Negative,
            _ => Polarity::Positive,
        }
    }

    /// The OpenStreetMap tag filter that selects this category.
    pub fn tag_filter(&self) -> TagFilter {
        use TagFilter::{AnyOf, Exact, Present};

        match self {
            Category::Park => Exact("leisure", "park"),
            Category::School => Exact("amenity", "school"),
            Category::University => Exact("amenity", "university"),
            Category::Hospital => Exact("amenity", "hospital"),
            Category::Clinic => Exact("amenity", "clinic"),
            Category::TransitStation => Exact("public_transport", "station"),
            Category::BusStop => Exact("highway", "bus_stop"),
            Category::Supermarket => Exact("shop", "supermarket"),
            Category::Pharmacy => Exact("amenity", "pharmacy"),
            Category::Library => Exact("amenity", "library"),
            Category::Restaurant => Exact("amenity", "restaurant"),
            Category::Cafe => Exact("amenity", "cafe"),
            Category::Bank => Exact("amenity", "bank"),
            Category::Playground => Exact("leisure", "playground"),
            Category::SportsCentre => Exact("leisure", "sports_centre"),
            Category::PlaceOfWorship => Exact("amenity", "place_of_worship"),
            Category::Parking => Exact("amenity", "parking"),
            Category::Fuel => Exact("amenity", "fuel"),
            Category::Railway => Present("railway"),
            Category::Residential => Exact("landuse", "residential"),
            Category::Industrial => Exact("landuse", "industrial"),
            Category::Construction => Exact("landuse", "construction"),
            Category::Landfill => Exact("landuse", "landfill"),
            Category::Highway => AnyOf(
                "highway",
                &["motorway", "motorway_link", "trunk", "trunk_link"],
            ),
            Category::WasteDisposal => Exact("amenity", "waste_disposal"),
            Category::Quarry => Exact("landuse", "quarry"),
            Category::PowerStation => Exact("power", "plant"),
            Category::NoiseBarrier => Exact("barrier", "noise_barrier"),
        }
    }

    /// Map marker icon and color for this category.
    pub fn marker_style(&self) -> MarkerStyle {
        let (icon, color) = match self {
            Category::Park => ("tree", "green"),
            Category::School => ("graduation-cap", "blue"),
            Category::University => ("graduation-cap", "darkblue"),
            Category::Hospital => ("plus-sign", "red"),
            Category::Clinic => ("medkit", "red"),
            Category::TransitStation => ("train", "cadetblue"),
            Category::BusStop => ("bus", "lightblue"),
            Category::Supermarket => ("shopping-cart", "darkgreen"),
            Category::Pharmacy => ("medkit", "lightred"),
            Category::Library => ("book", "purple"),
            Category::Restaurant => ("cutlery", "orange"),
            Category::Cafe => ("coffee", "beige"),
            Category::Bank => ("usd", "darkpurple"),
            Category::Playground => ("child", "lightgreen"),
            Category::SportsCentre => ("flag", "darkgreen"),
            Category::PlaceOfWorship => ("star", "gray"),
            Category::Parking => ("road", "lightgray"),
            Category::Fuel => ("tint", "darkred"),
            Category::Railway => ("train", "black"),
            Category::Residential => ("home", "lightgray"),
            Category::Industrial => ("industry", "black"),
            Category::Construction => ("wrench", "gray"),
            Category::Landfill => ("trash", "gray"),
            Category::Highway => ("road", "darkgray"),
            Category::WasteDisposal => ("trash", "darkgray"),
            Category::Quarry => ("warning-sign", "gray"),
            Category::PowerStation => ("flash", "black"),
            Category::NoiseBarrier => ("minus-sign", "lightgray"),
        };
        MarkerStyle { icon, color }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = PoiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(|c: char| c == ' ' || c == '-', "_");
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| PoiError::UnknownCategory(s.to_string()))
    }
}

/// An OpenStreetMap tag filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFilter {
    /// `key=value`
    Exact(&'static str, &'static str),
    /// `key` equal to any of the listed values
    AnyOf(&'static str, &'static [&'static str]),
    /// `key` present with any value
    Present(&'static str),
}

impl TagFilter {
    /// Render as an Overpass QL tag selector, e.g. `["amenity"="school"]`.
    pub fn overpass_selector(&self) -> String {
        match self {
            TagFilter::Exact(key, value) => format!("[\"{}\"=\"{}\"]", key, value),
            TagFilter::AnyOf(key, values) => format!("[\"{}\"~\"^({})$\"]", key, values.join("|")),
            TagFilter::Present(key) => format!("[\"{}\"]", key),
        }
    }
}

/// Icon name and color used to draw a category on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerStyle {
    pub icon: &'static str,
    pub color: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_categories_listed_once() {
        let unique: HashSet<Category> = Category::ALL.iter().copied().collect();
        assert_eq!(unique.len(), Category::ALL.len());
    }

    #[test]
    fn test_positive_categories_queried_first() {
        let first_negative = Category::ALL
            .iter()
            .position(|c| c.polarity() == Polarity::Negative)
            .unwrap();
        assert!(Category::ALL[first_negative..]
            .iter()
            .all(|c| c.polarity() == Polarity::Negative));
        assert_eq!(Category::ALL.len() - first_negative, 8);
    }

    #[test]
    fn test_ordering_matches_labels() {
        let mut by_variant = Category::ALL.to_vec();
        by_variant.sort();
        let mut by_label = Category::ALL.to_vec();
        by_label.sort_by_key(|c| c.as_str());
        assert_eq!(by_variant, by_label);
        assert!(Polarity::Negative < Polarity::Positive);
    }

    #[test]
    fn test_serde_labels() {
        let json = serde_json::to_string(&Category::PlaceOfWorship).unwrap();
        assert_eq!(json, "\"place_of_worship\"");
        let polarity: Polarity = serde_json::from_str("\"negative\"").unwrap();
        assert_eq!(polarity, Polarity::Negative);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("bus_stop".parse::<Category>().unwrap(), Category::BusStop);
        assert_eq!("Place of Worship".parse::<Category>().unwrap(), Category::PlaceOfWorship);
        assert!(matches!(
            "volcano".parse::<Category>(),
            Err(PoiError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_overpass_selectors() {
        assert_eq!(
            Category::School.tag_filter().overpass_selector(),
            "[\"amenity\"=\"school\"]"
        );
        assert_eq!(Category::Railway.tag_filter().overpass_selector(), "[\"railway\"]");
        assert_eq!(
            Category::Highway.tag_filter().overpass_selector(),
            "[\"highway\"~\"^(motorway|motorway_link|trunk|trunk_link)$\"]"
        );
    }
}
