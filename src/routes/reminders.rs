use axum::{extract::State, http::HeaderMap, Json};
use subtle::ConstantTimeEq;

use crate::{
    error::{Error, Result},
    services::reminder_service::ReminderRunReport,
    AppState,
};

/// Runs a reminder scan on demand and returns its report.
pub async fn run_reminders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ReminderRunReport>> {
    let Some(expected) = state.trigger_secret.as_deref() else {
        return Err(Error::NotFound("manual trigger is disabled".into()));
    };
    verify_secret(&headers, expected)?;

    let Some(report) = state.reminder_service.run_once().await? else {
        return Err(Error::Conflict("a reminder run is already in progress".into()));
    };
    report.log();
    Ok(Json(report))
}

fn verify_secret(headers: &HeaderMap, expected: &str) -> Result<()> {
    let Some(secret_hdr) = headers.get("x-trigger-secret") else {
        return Err(Error::Unauthorized("missing_trigger_secret".into()));
    };
    let provided = secret_hdr
        .to_str()
        .map_err(|_| Error::Unauthorized("invalid_secret_header".into()))?;
    if ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into() {
        Ok(())
    } else {
        Err(Error::Unauthorized("invalid_trigger_secret".into()))
    }
}
