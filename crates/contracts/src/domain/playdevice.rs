use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::defect::Defect;
use crate::domain::inspection::{InspectionCriterion, InspectionReport};
use crate::shared::geometry::PointGeometry;

/// GeoJSON-style feature for a play-device, the unit the client renders on
/// the map and in the inspection forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaydeviceFeature {
    #[serde(rename = "type", default = "feature_kind")]
    pub kind: String,
    #[serde(default)]
    pub properties: PlaydeviceFeatureProperties,
    #[serde(default)]
    pub geometry: PointGeometry,
    #[serde(default)]
    pub playdevice_details: Vec<PlaydeviceDetail>,
}

impl Default for PlaydeviceFeature {
    fn default() -> Self {
        PlaydeviceFeature {
            kind: feature_kind(),
            properties: PlaydeviceFeatureProperties::default(),
            geometry: PointGeometry::empty(),
            playdevice_details: Vec::new(),
        }
    }
}

/// A detail (component) of a play-device. Shares the property shape of its
/// parent; only a subset of the fields is populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaydeviceDetail {
    #[serde(rename = "type", default = "feature_kind")]
    pub kind: String,
    #[serde(default)]
    pub properties: PlaydeviceFeatureProperties,
}

impl Default for PlaydeviceDetail {
    fn default() -> Self {
        PlaydeviceDetail {
            kind: feature_kind(),
            properties: PlaydeviceFeatureProperties::default(),
        }
    }
}

fn feature_kind() -> String {
    "Feature".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaydeviceFeatureProperties {
    #[serde(default)]
    pub fid: i32,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub lebensdauer: i32,
    #[serde(default)]
    pub comment: String,
    #[serde(rename = "type", default)]
    pub device_type: PlaydeviceType,
    #[serde(default)]
    pub date_of_service: Option<NaiveDateTime>,
    #[serde(default)]
    pub general_inspection_criteria: Vec<InspectionCriterion>,
    #[serde(default)]
    pub main_fall_protection_inspection_criteria: Vec<InspectionCriterion>,
    #[serde(default)]
    pub secondary_fall_protection_inspection_criteria: Vec<InspectionCriterion>,
    #[serde(default)]
    pub cost_estimation: f32,
    #[serde(default)]
    pub recommended_year_of_renovation: i32,
    #[serde(default)]
    pub comment_recommended_year_of_renovation: String,
    #[serde(default)]
    pub defects: Vec<Defect>,
    #[serde(default)]
    pub last_inspection_reports: Vec<InspectionReport>,
    #[serde(default)]
    pub next_to_last_inspection_reports: Vec<InspectionReport>,
    #[serde(default)]
    pub picture_base64_string: String,
    #[serde(default)]
    pub map_image_base64_string: String,
}

/// Catalog entry of a play-device type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaydeviceType {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub standard: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_defaults_to_geojson_feature() {
        let feature = PlaydeviceFeature::default();
        let value = serde_json::to_value(&feature).unwrap();
        assert_eq!(value["type"], "Feature");
        assert_eq!(value["geometry"]["type"], "Point");
        assert_eq!(value["properties"]["fid"], 0);
    }

    #[test]
    fn properties_parse_nested_type_object() {
        let props: PlaydeviceFeatureProperties = serde_json::from_str(
            r#"{"fid":9,"type":{"name":"Schaukel","description":"","standard":"EN 1176"}}"#,
        )
        .unwrap();
        assert_eq!(props.fid, 9);
        assert_eq!(props.device_type.name, "Schaukel");
        assert_eq!(props.device_type.standard, "EN 1176");
    }
}
