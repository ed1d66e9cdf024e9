//! Analysis output for the presentation layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::{build_markers, AnalysisConfig, Category, GeoPoint, Marker, MergedPoi, Polarity, Result};

/// Everything found around one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiReport {
    pub location: String,
    pub center: GeoPoint,
    pub radius_miles: f64,
    /// Deduplicated and capped POIs, ordered by (polarity, category, distance)
    pub pois: Vec<MergedPoi>,
    /// Representatives per singleton category
    #[serde(default)]
    pub clusters: BTreeMap<Category, Vec<GeoPoint>>,
    /// Categories whose fetch failed and contributed nothing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_categories: Vec<Category>,
}

impl PoiReport {
    /// No points of interest were found.
    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    /// POIs whose primary category is positive.
    pub fn positive(&self) -> impl Iterator<Item = &MergedPoi> {
        self.with_polarity(Polarity::Positive)
    }

    /// POIs whose primary category is negative.
    pub fn negative(&self) -> impl Iterator<Item = &MergedPoi> {
        self.with_polarity(Polarity::Negative)
    }

    fn with_polarity(&self, polarity: Polarity) -> impl Iterator<Item = &MergedPoi> {
        self.pois.iter().filter(move |p| p.poi.polarity == polarity)
    }

    /// Input for the text-summary collaborator.
    pub fn summary_payload(&self, property_type: impl Into<String>) -> SummaryPayload {
        SummaryPayload {
            property_type: property_type.into(),
            location: self.location.clone(),
            radius_miles: self.radius_miles,
            positive_pois: self.positive().cloned().collect(),
            negative_pois: self.negative().cloned().collect(),
        }
    }

    /// Map markers using the clustering settings of `config`.
    pub fn markers(&self, config: &AnalysisConfig) -> Vec<Marker> {
        build_markers(&self.pois, &config.singleton_categories, config.cluster_radius_miles)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// POIs split by polarity, with the context a summary needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryPayload {
    pub property_type: String,
    pub location: String,
    pub radius_miles: f64,
    pub positive_pois: Vec<MergedPoi>,
    pub negative_pois: Vec<MergedPoi>,
}
