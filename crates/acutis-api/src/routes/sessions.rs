use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use acutis_core::error::{ErrorKind, FormError};
use acutis_core::models::field::FieldValue;
use acutis_core::models::session::{IntakeSession, SessionPatch};
use acutis_core::models::template::FormTemplate;
use acutis_intake::IntakeError;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    template_id: Uuid,
    #[serde(default)]
    admission_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FieldRequest {
    value: FieldValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    can_advance: bool,
    errors: BTreeMap<String, String>,
}

pub async fn start_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<StartRequest>,
) -> Result<(StatusCode, Json<IntakeSession>), ApiError> {
    let session = state
        .intake
        .sessions
        .start_session(request.template_id, request.admission_id, &user.sub)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<IntakeSession>, ApiError> {
    Ok(Json(state.intake.sessions.resume(id).await?))
}

/// The session's template, expanded for rendering.
pub async fn get_session_template(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<FormTemplate>, ApiError> {
    let session = state.intake.sessions.resume(id).await?;
    let template = state
        .intake
        .templates
        .get_template_by_id(session.template_id)
        .await
        .ok_or_else(|| FormError::not_found("template", session.template_id))?;
    Ok(Json(state.intake.library.expand(&template).await))
}

pub async fn patch_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<SessionPatch>,
) -> Result<Json<IntakeSession>, ApiError> {
    let session = state
        .intake
        .sessions
        .patch_session(id, patch, &user.sub)
        .await?;
    Ok(Json(session))
}

pub async fn set_field(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((id, field_id)): ApiPath<(Uuid, String)>,
    ApiJson(request): ApiJson<FieldRequest>,
) -> Result<Json<IntakeSession>, ApiError> {
    let session = state
        .intake
        .sessions
        .set_field(id, &field_id, request.value, &user.sub)
        .await?;
    Ok(Json(session))
}

pub async fn step_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<StepStatus>, ApiError> {
    let session = state.intake.sessions.resume(id).await?;
    let errors = state.intake.sessions.step_errors(id).await?;
    Ok(Json(StepStatus {
        can_advance: !session.is_completed() && errors.is_empty(),
        errors,
    }))
}

pub async fn advance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<IntakeSession>, ApiError> {
    match state.intake.sessions.advance(id, &user.sub).await {
        Ok(session) => Ok(Json(session)),
        Err(e) => Err(with_step_errors(&state, id, e).await),
    }
}

pub async fn retreat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<IntakeSession>, ApiError> {
    Ok(Json(state.intake.sessions.retreat(id, &user.sub).await?))
}

pub async fn complete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<IntakeSession>, ApiError> {
    match state.intake.sessions.complete_session(id, &user.sub).await {
        Ok(session) => Ok(Json(session)),
        Err(e) => Err(with_step_errors(&state, id, e).await),
    }
}

/// Attach the current step's field errors to a refused transition so the
/// client can show them inline.
async fn with_step_errors(state: &AppState, id: Uuid, err: IntakeError) -> ApiError {
    if err.kind() != Some(ErrorKind::InvalidTransition) {
        return err.into();
    }
    let message = err.to_string();
    match state.intake.sessions.step_errors(id).await {
        Ok(fields) if !fields.is_empty() => ApiError::InvalidTransition {
            message,
            fields: Some(fields),
        },
        _ => err.into(),
    }
}
