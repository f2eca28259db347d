use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::defect::Defect;

/// One report line of an inspection, targeting either a play-device or one
/// of its details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionReport {
    #[serde(default)]
    pub tid: i32,
    #[serde(default)]
    pub inspection_type: String,
    #[serde(default)]
    pub date_of_service: Option<NaiveDateTime>,
    #[serde(default)]
    pub inspector: String,
    #[serde(default)]
    pub inspection_text: String,
    #[serde(default)]
    pub inspection_done: bool,
    #[serde(default)]
    pub inspection_comment: String,
    #[serde(default)]
    pub maintenance_text: String,
    #[serde(default)]
    pub maintenance_done: bool,
    #[serde(default)]
    pub maintenance_comment: String,
    #[serde(default)]
    pub fall_protection_type: String,
    #[serde(default)]
    pub defects: Vec<Defect>,
    #[serde(default)]
    pub playdevice_fid: i32,
    #[serde(default)]
    pub playdevice_detail_fid: i32,
    #[serde(default)]
    pub playdevice_date_of_service: Option<NaiveDateTime>,
}

impl Default for InspectionReport {
    fn default() -> Self {
        InspectionReport {
            tid: 0,
            inspection_type: String::new(),
            date_of_service: None,
            inspector: String::new(),
            inspection_text: String::new(),
            inspection_done: false,
            inspection_comment: String::new(),
            maintenance_text: String::new(),
            maintenance_done: false,
            maintenance_comment: String::new(),
            fall_protection_type: String::new(),
            defects: Vec::new(),
            playdevice_fid: 0,
            playdevice_detail_fid: 0,
            playdevice_date_of_service: None,
        }
    }
}

/// Payload of an inspection submission: the reports of one walk-through plus
/// any standalone defects the inspector noted on the way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionReportsAndDefects {
    #[serde(default)]
    pub inspection_reports: Vec<InspectionReport>,
    #[serde(default)]
    pub defects: Vec<Defect>,
}

/// A single check of an inspection checklist, together with the report the
/// client is currently filling in for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionCriterion {
    #[serde(default)]
    pub realm: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub check: String,
    #[serde(default)]
    pub check_short_text: String,
    #[serde(default)]
    pub maintenance: String,
    #[serde(default)]
    pub before_opening: bool,
    #[serde(default)]
    pub weekly: bool,
    #[serde(default)]
    pub monthly: bool,
    #[serde(default)]
    pub yearly: bool,
    #[serde(default)]
    pub inspection_type: String,
    #[serde(default)]
    pub current_inspection_report: InspectionReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_tolerates_missing_defects_array() {
        let payload: InspectionReportsAndDefects =
            serde_json::from_str(r#"{"inspectionReports":[]}"#).unwrap();
        assert!(payload.inspection_reports.is_empty());
        assert!(payload.defects.is_empty());
    }

    #[test]
    fn report_uses_wire_field_names() {
        let report: InspectionReport = serde_json::from_str(
            r#"{"inspectionType":"Visuelle Kontrolle (visu)","playdeviceFid":3,
                "dateOfService":"2026-05-11T00:00:00"}"#,
        )
        .unwrap();
        assert_eq!(report.inspection_type, "Visuelle Kontrolle (visu)");
        assert_eq!(report.playdevice_fid, 3);
        assert!(report.date_of_service.is_some());
    }
}
