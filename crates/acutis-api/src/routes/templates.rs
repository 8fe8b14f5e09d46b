use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use acutis_core::error::FormError;
use acutis_core::models::template::{FormTemplate, NewTemplate, TemplateFilter, TemplatePatch};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateQuery {
    /// Return the template with element references resolved.
    #[serde(default)]
    expanded: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitQuery {
    #[serde(default)]
    form_type: Option<String>,
    #[serde(default)]
    expanded: bool,
}

#[derive(Debug, Deserialize)]
pub struct DuplicateRequest {
    name: String,
}

pub async fn list_templates(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<TemplateFilter>,
) -> Json<Vec<FormTemplate>> {
    Json(state.intake.templates.list_templates(&filter).await)
}

pub async fn get_template(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<TemplateQuery>,
) -> Result<Json<FormTemplate>, ApiError> {
    let template = state
        .intake
        .templates
        .get_template_by_id(id)
        .await
        .ok_or_else(|| FormError::not_found("template", id))?;
    Ok(Json(maybe_expand(&state, template, query.expanded).await))
}

pub async fn get_template_by_unit(
    State(state): State<AppState>,
    ApiPath(unit): ApiPath<String>,
    ApiQuery(query): ApiQuery<UnitQuery>,
) -> Result<Json<FormTemplate>, ApiError> {
    let template = state
        .intake
        .templates
        .get_template_by_unit(&unit, query.form_type.as_deref())
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no active template for unit: {unit}")))?;
    Ok(Json(maybe_expand(&state, template, query.expanded).await))
}

async fn maybe_expand(state: &AppState, template: FormTemplate, expanded: bool) -> FormTemplate {
    if expanded {
        state.intake.library.expand(&template).await
    } else {
        template
    }
}

pub async fn create_template(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(new): ApiJson<NewTemplate>,
) -> Result<(StatusCode, Json<FormTemplate>), ApiError> {
    let template = state
        .intake
        .templates
        .create_template(new, &user.sub)
        .await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn update_template(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<TemplatePatch>,
) -> Result<Json<FormTemplate>, ApiError> {
    let template = state
        .intake
        .templates
        .update_template(id, patch, &user.sub)
        .await?;
    Ok(Json(template))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.intake.templates.delete_template(id, &user.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn duplicate_template(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<DuplicateRequest>,
) -> Result<(StatusCode, Json<FormTemplate>), ApiError> {
    let copy = state
        .intake
        .templates
        .duplicate_template(id, &request.name, &user.sub)
        .await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

pub async fn activate_template(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<FormTemplate>, ApiError> {
    let activation = state
        .intake
        .templates
        .activate_template(id, &user.sub)
        .await?;
    Ok(Json(activation.activated))
}

/// Expand a template that is not stored, e.g. a draft being edited.
pub async fn expand_template(
    State(state): State<AppState>,
    ApiJson(template): ApiJson<FormTemplate>,
) -> Json<FormTemplate> {
    Json(state.intake.library.expand(&template).await)
}
