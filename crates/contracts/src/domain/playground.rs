use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::playdevice::PlaydeviceFeature;
use crate::shared::geometry::PointGeometry;

/// Full playground aggregate as delivered to the inspection client: the
/// playground itself, its devices, and the lookup option lists the client
/// needs to render its forms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playground {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub playdevices: Vec<PlaydeviceFeature>,
    #[serde(default)]
    pub date_of_last_inspection: Option<NaiveDateTime>,
    #[serde(default)]
    pub has_open_device_defects: bool,
    #[serde(default)]
    pub has_open_device_detail_defects: bool,
    #[serde(default)]
    pub defect_priority_options: Vec<String>,
    #[serde(default)]
    pub inspection_type_options: Vec<String>,
}

/// GeoJSON-style feature for the public playground collection endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundFeature {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: PlaygroundFeatureProperties,
    #[serde(default)]
    pub geometry: PointGeometry,
    #[serde(default)]
    pub error_message: String,
}

impl Default for PlaygroundFeature {
    fn default() -> Self {
        PlaygroundFeature {
            kind: "Feature".to_string(),
            properties: PlaygroundFeatureProperties::default(),
            geometry: PointGeometry::empty(),
            error_message: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundFeatureProperties {
    #[serde(default = "negative_one")]
    pub fid: i32,
    #[serde(default = "negative_one")]
    pub nummer: i32,
    #[serde(default)]
    pub name: String,
}

fn negative_one() -> i32 {
    -1
}

impl Default for PlaygroundFeatureProperties {
    fn default() -> Self {
        PlaygroundFeatureProperties {
            fid: -1,
            nummer: -1,
            name: String::new(),
        }
    }
}

/// Collection wrapper for the public feature listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundFeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<PlaygroundFeature>,
}

impl PlaygroundFeatureCollection {
    pub fn new(features: Vec<PlaygroundFeature>) -> Self {
        PlaygroundFeatureCollection {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_wraps_features() {
        let collection = PlaygroundFeatureCollection::new(vec![PlaygroundFeature::default()]);
        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["properties"]["fid"], -1);
    }

    #[test]
    fn playground_aggregate_serializes_option_lists() {
        let playground = Playground {
            id: 5,
            name: "Brunnenwiese".into(),
            defect_priority_options: vec!["hoch (sofort beheben)".into()],
            ..Playground::default()
        };
        let value = serde_json::to_value(&playground).unwrap();
        assert_eq!(value["defectPriorityOptions"][0], "hoch (sofort beheben)");
        assert_eq!(value["dateOfLastInspection"], serde_json::Value::Null);
    }
}
