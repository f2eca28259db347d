use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open or resolved deficiency recorded against a play-device.
///
/// `priority` and `defects_responsible_body_id` reference lookup tables;
/// `-1` stands for "not set" on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defect {
    #[serde(default = "default_tid")]
    pub tid: i32,
    #[serde(default)]
    pub playdevice_fid: i32,
    #[serde(default = "default_tid")]
    pub priority: i32,
    #[serde(default)]
    pub defect_pics_tids: Vec<i32>,
    #[serde(default)]
    pub defect_pics_after_fixing_tids: Vec<i32>,
    #[serde(default)]
    pub defect_description: String,
    #[serde(default)]
    pub date_creation: Option<NaiveDate>,
    #[serde(default)]
    pub date_done: Option<NaiveDate>,
    #[serde(default)]
    pub defect_comment: String,
    #[serde(default = "default_tid")]
    pub defects_responsible_body_id: i32,
    #[serde(default)]
    pub error_message: String,
}

fn default_tid() -> i32 {
    -1
}

impl Default for Defect {
    fn default() -> Self {
        Defect {
            tid: -1,
            playdevice_fid: 0,
            priority: -1,
            defect_pics_tids: Vec::new(),
            defect_pics_after_fixing_tids: Vec::new(),
            defect_description: String::new(),
            date_creation: None,
            date_done: None,
            defect_comment: String::new(),
            defects_responsible_body_id: -1,
            error_message: String::new(),
        }
    }
}

/// Image payload attached to a defect, taken either when the defect was
/// reported or after it was fixed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectPicture {
    #[serde(default)]
    pub base64_string_picture: String,
    #[serde(default)]
    pub base64_string_picture_thumb: String,
    #[serde(default)]
    pub after_fixing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defect_defaults_match_missing_wire_fields() {
        let defect: Defect = serde_json::from_str(r#"{"playdeviceFid":42}"#).unwrap();
        assert_eq!(defect.tid, -1);
        assert_eq!(defect.priority, -1);
        assert_eq!(defect.defects_responsible_body_id, -1);
        assert_eq!(defect.playdevice_fid, 42);
        assert!(defect.defect_pics_tids.is_empty());
    }

    #[test]
    fn defect_serializes_with_camel_case_names() {
        let defect = Defect {
            playdevice_fid: 7,
            priority: 2,
            defect_description: "Schraube lose".into(),
            ..Defect::default()
        };
        let value = serde_json::to_value(&defect).unwrap();
        assert_eq!(value["playdeviceFid"], 7);
        assert_eq!(value["defectDescription"], "Schraube lose");
        assert_eq!(value["defectsResponsibleBodyId"], -1);
    }
}
