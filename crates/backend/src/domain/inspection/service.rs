use anyhow::Result;
use chrono::NaiveDate;
use contracts::domain::inspection::{InspectionReport, InspectionReportsAndDefects};
use sea_orm::TransactionTrait;
use std::collections::BTreeSet;

use crate::domain::defect::repository as defect_repository;
use crate::domain::inspection::repository;
use crate::shared::state::AppState;
use crate::system::users::repository::StoredUser;

/// Outcome of a submission: accepted, or rejected with one of the short
/// error codes the client knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted,
    Rejected(&'static str),
}

impl SubmissionOutcome {
    pub fn error_code(&self) -> &'static str {
        match self {
            SubmissionOutcome::Accepted => "",
            SubmissionOutcome::Rejected(code) => code,
        }
    }
}

/// Synchronous checks that run before anything touches the database:
/// the batch must be non-empty, carry exactly one inspection type, and
/// every report needs a service date.
pub fn validate_batch(reports: &[InspectionReport]) -> Option<&'static str> {
    if reports.is_empty() {
        return Some("SPK-0");
    }

    let inspection_type = reports[0].inspection_type.trim();
    if inspection_type.is_empty() {
        return Some("SPK-6");
    }

    for report in reports {
        if report.inspection_type.trim() != inspection_type {
            return Some("SPK-6");
        }
        if report.playdevice_date_of_service.is_none() {
            return Some("SPK-1");
        }
    }

    None
}

/// Distinct (playdevice, date) keys of a batch, in stable order. A device
/// can appear on several dates within one batch; every pair gets its own
/// duplicate check.
fn distinct_device_dates(reports: &[InspectionReport]) -> BTreeSet<(i32, NaiveDate)> {
    let mut keys = BTreeSet::new();
    for report in reports {
        if report.playdevice_fid > 0 {
            if let Some(date_of_service) = report.playdevice_date_of_service {
                keys.insert((report.playdevice_fid, date_of_service.date()));
            }
        }
    }
    keys
}

/// Store a full submission: one parent inspection row, one report per
/// eligible device, and the defects attached to the reports, all inside
/// one transaction holding an exclusive lock on the report table.
pub async fn submit(
    state: &AppState,
    payload: &InspectionReportsAndDefects,
    user: &StoredUser,
    dry_run: bool,
) -> Result<SubmissionOutcome> {
    let reports = &payload.inspection_reports;

    if let Some(code) = validate_batch(reports) {
        return Ok(SubmissionOutcome::Rejected(code));
    }

    let txn = state.db.begin().await?;

    let outcome = write_submission(&txn, payload, user, dry_run).await;

    match outcome {
        Ok(outcome) => {
            txn.commit().await?;
            Ok(outcome)
        }
        Err(err) => {
            tracing::error!("Error while storing inspection reports: {err:#}");
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(
                    "Error while rolling back inspection report storage: {rollback_err:#}"
                );
            }
            Ok(SubmissionOutcome::Rejected("SPK-3"))
        }
    }
}

async fn write_submission(
    txn: &sea_orm::DatabaseTransaction,
    payload: &InspectionReportsAndDefects,
    user: &StoredUser,
    dry_run: bool,
) -> Result<SubmissionOutcome> {
    let reports = &payload.inspection_reports;
    let first_report = &reports[0];
    let inspection_type = first_report.inspection_type.trim();

    repository::lock_reports_table(txn).await?;

    // With the lock held, a batch already stored by a concurrent caller
    // is visible here, so a re-sent submission always trips this check.
    for (playdevice_fid, date) in distinct_device_dates(reports) {
        let existing =
            repository::count_reports_for_key(txn, playdevice_fid, inspection_type, date).await?;
        if existing > 0 {
            tracing::warn!(
                "Duplicate submission for playdevice {} on {} rejected",
                playdevice_fid,
                date
            );
            return Ok(SubmissionOutcome::Rejected("SPK-2"));
        }
    }

    let base_name = repository::base_type_name(inspection_type);
    let type_id = repository::type_id_by_value(txn, base_name).await?;

    let playground_fid = if first_report.playdevice_fid != 0 {
        repository::playground_fid_of_playdevice(txn, first_report.playdevice_fid).await?
    } else {
        None
    };

    let target_date = match (playground_fid, type_id) {
        (Some(playground), Some(type_id)) => {
            repository::target_inspection_date(txn, playground, type_id).await?
        }
        _ => None,
    };

    // validate_batch already guaranteed a service date on every report
    let inspection_date = match first_report.playdevice_date_of_service {
        Some(date_of_service) => date_of_service.date(),
        None => return Ok(SubmissionOutcome::Rejected("SPK-1")),
    };

    if dry_run {
        return Ok(SubmissionOutcome::Accepted);
    }

    let inspection_tid = repository::insert_inspection(
        txn,
        type_id,
        playground_fid,
        inspection_date,
        user.fid,
        target_date,
    )
    .await?;

    let inspector_name = format!("{} {}", user.first_name, user.last_name);

    let mut last_report_tid = -1;
    for report in reports {
        if report.playdevice_fid != 0 && !repository::can_be_checked(txn, report.playdevice_fid).await? {
            continue;
        }

        let report_date = match report.playdevice_date_of_service {
            Some(date_of_service) => date_of_service.date(),
            None => inspection_date,
        };

        let report_tid =
            repository::insert_report(txn, inspection_tid, report, report_date, &inspector_name)
                .await?;
        last_report_tid = report_tid;

        for defect in &report.defects {
            defect_repository::insert(txn, defect, Some(report_tid), user.fid, false).await?;
        }
    }

    for defect in &payload.defects {
        let report_tid = (last_report_tid > 0).then_some(last_report_tid);
        defect_repository::insert(txn, defect, report_tid, user.fid, false).await?;
    }

    Ok(SubmissionOutcome::Accepted)
}

/// Inspection type options, formatted "value (short)".
pub async fn type_options(state: &AppState) -> Result<Vec<String>> {
    repository::type_options(&state.db).await
}

/// Renovation type names.
pub async fn renovation_type_options(state: &AppState) -> Result<Vec<String>> {
    repository::renovation_type_options(&state.db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn report(fid: i32, inspection_type: &str, date: Option<&str>) -> InspectionReport {
        InspectionReport {
            playdevice_fid: fid,
            inspection_type: inspection_type.to_string(),
            playdevice_date_of_service: date
                .map(|d| NaiveDateTime::parse_from_str(d, "%Y-%m-%dT%H:%M:%S").unwrap()),
            ..InspectionReport::default()
        }
    }

    #[test]
    fn empty_batch_is_rejected_first() {
        assert_eq!(validate_batch(&[]), Some("SPK-0"));
    }

    #[test]
    fn missing_inspection_type_is_rejected() {
        let batch = vec![report(1, "", Some("2026-05-11T00:00:00"))];
        assert_eq!(validate_batch(&batch), Some("SPK-6"));
    }

    #[test]
    fn mixed_inspection_types_are_rejected() {
        let batch = vec![
            report(1, "Hauptinspektion (HI)", Some("2026-05-11T00:00:00")),
            report(2, "Visuelle Kontrolle (VK)", Some("2026-05-11T00:00:00")),
        ];
        assert_eq!(validate_batch(&batch), Some("SPK-6"));
    }

    #[test]
    fn missing_service_date_is_rejected() {
        let batch = vec![
            report(1, "Hauptinspektion (HI)", Some("2026-05-11T00:00:00")),
            report(2, "Hauptinspektion (HI)", None),
        ];
        assert_eq!(validate_batch(&batch), Some("SPK-1"));
    }

    #[test]
    fn valid_batch_passes() {
        let batch = vec![
            report(1, "Hauptinspektion (HI)", Some("2026-05-11T00:00:00")),
            report(2, "Hauptinspektion (HI)", Some("2026-05-11T00:00:00")),
        ];
        assert_eq!(validate_batch(&batch), None);
    }

    fn date(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn every_device_date_pair_gets_its_own_key() {
        let batch = vec![
            report(7, "Hauptinspektion (HI)", Some("2026-05-11T00:00:00")),
            report(7, "Hauptinspektion (HI)", Some("2026-05-12T00:00:00")),
            report(3, "Hauptinspektion (HI)", Some("2026-05-11T00:00:00")),
            // detail-only reports carry no device fid
            report(0, "Hauptinspektion (HI)", Some("2026-05-11T00:00:00")),
        ];
        let keys = distinct_device_dates(&batch);
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&(7, date("2026-05-11"))));
        assert!(keys.contains(&(7, date("2026-05-12"))));
        assert!(keys.contains(&(3, date("2026-05-11"))));
    }

    #[test]
    fn repeated_reports_collapse_to_one_key() {
        let batch = vec![
            report(7, "Hauptinspektion (HI)", Some("2026-05-11T00:00:00")),
            report(7, "Hauptinspektion (HI)", Some("2026-05-11T08:30:00")),
        ];
        let keys = distinct_device_dates(&batch);
        assert_eq!(keys.len(), 1);
        assert!(keys.contains(&(7, date("2026-05-11"))));
    }
}
