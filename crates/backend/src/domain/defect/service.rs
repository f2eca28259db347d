use anyhow::Result;
use contracts::domain::defect::{Defect, DefectPicture};

use crate::domain::defect::repository;
use crate::shared::pictures;
use crate::shared::state::AppState;
use crate::system::users::repository::StoredUser;

/// One defect with its picture tid lists.
pub async fn get_defect(state: &AppState, tid: i32) -> Result<Option<Defect>> {
    repository::read(&state.db, tid).await
}

/// Insert new defects reported outside an inspection. Entries without a
/// description are skipped. Returns the tids that were assigned.
pub async fn create_defects(
    state: &AppState,
    defects: &[Defect],
    user: &StoredUser,
    dry_run: bool,
) -> Result<Vec<i32>> {
    let mut assigned = Vec::new();
    for defect in defects {
        let tid = repository::insert(&state.db, defect, None, user.fid, dry_run).await?;
        if tid > 0 {
            assigned.push(tid);
        }
    }
    Ok(assigned)
}

/// Apply updates to existing defects.
pub async fn update_defects(
    state: &AppState,
    defects: &[Defect],
    user: &StoredUser,
    dry_run: bool,
) -> Result<()> {
    for defect in defects {
        repository::update(&state.db, defect, user.fid, dry_run).await?;
    }
    Ok(())
}

/// Decode a stored defect picture into raw bytes and a content type.
pub async fn get_picture(state: &AppState, tid: i32) -> Result<Option<(Vec<u8>, &'static str)>> {
    let stored = repository::read_picture(&state.db, tid).await?;
    Ok(stored.map(|bytes| pictures::decode_stored(&bytes)))
}

/// Replace the payload of an existing picture row. Returns false when the
/// payload is not decodable or no row matched.
pub async fn put_picture(
    state: &AppState,
    tid: i32,
    payload: &str,
    dry_run: bool,
) -> Result<bool> {
    let bytes = match pictures::normalize_upload(payload) {
        Some(bytes) => bytes,
        None => return Ok(false),
    };
    if dry_run {
        return Ok(true);
    }
    let affected = repository::update_picture(&state.db, tid, &bytes, false).await?;
    Ok(affected == 1)
}

/// Attach a new picture to a defect. Returns the new picture tid.
pub async fn attach_picture(
    state: &AppState,
    defect_tid: i32,
    picture: &DefectPicture,
    dry_run: bool,
) -> Result<Option<i32>> {
    let bytes = match pictures::normalize_upload(&picture.base64_string_picture) {
        Some(bytes) => bytes,
        None => return Ok(None),
    };
    let tid =
        repository::insert_picture(&state.db, defect_tid, &bytes, picture.after_fixing, dry_run)
            .await?;
    Ok((tid > 0).then_some(tid))
}

/// Display strings of the priority lookup.
pub async fn priority_options(state: &AppState) -> Result<Vec<String>> {
    repository::priority_options(&state.db).await
}
