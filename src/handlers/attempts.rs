//! Phishing attempt handlers
//!
//! The read path: every request is answered from a single point-in-time
//! query. Subscriptions belong to the watcher, not to requests.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::models::{AttemptFilter, AttemptRecord, PhishingAttempt, ReportAttempt};
use crate::{AppError, AppResult, AppState};

/// List phishing attempts, optionally filtered by category
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<AttemptFilter>,
) -> AppResult<Json<Vec<AttemptRecord>>> {
    let attempts = PhishingAttempt::list(&state.pool, &filter).await?;
    Ok(Json(crate::models::project_all(&attempts)))
}

/// Get single phishing attempt
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AttemptRecord>> {
    let attempt = PhishingAttempt::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Phishing attempt not found".to_string()))?;

    Ok(Json(attempt.project()))
}

/// Report a new phishing attempt. The insert fires the change trigger,
/// which wakes the watcher and fans the fresh snapshot out to the
/// notification channels.
pub async fn report(
    State(state): State<AppState>,
    Json(req): Json<ReportAttempt>,
) -> AppResult<(StatusCode, Json<AttemptRecord>)> {
    let attempt = PhishingAttempt::create(&state.pool, req).await?;

    tracing::info!(
        id = %attempt.id,
        category = attempt.category.as_deref().unwrap_or("-"),
        "Phishing attempt reported"
    );

    Ok((StatusCode::CREATED, Json(attempt.project())))
}
