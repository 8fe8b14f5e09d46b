use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use acutis_core::error::FormError;
use acutis_core::models::element::{
    ElementCategory, ElementCheck, FormElement, LibrarySnapshot, NewElement,
};
use acutis_core::models::field::FieldDefinition;
use acutis_forms::ElementLibrary;
use acutis_forms::library::LibraryStatistics;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

const DEFAULT_POPULAR_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CloneRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct IdsRequest {
    ids: Vec<String>,
}

pub async fn get_library(State(state): State<AppState>) -> Json<LibrarySnapshot> {
    Json(state.intake.library.snapshot().await)
}

pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ElementCategory>, ApiError> {
    let category = state
        .intake
        .library
        .category(&id)
        .await
        .ok_or_else(|| FormError::not_found("category", &id))?;
    Ok(Json(category))
}

pub async fn get_element(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<FormElement>, ApiError> {
    let element = state
        .intake
        .library
        .get_element(&id)
        .await
        .ok_or_else(|| FormError::not_found("element", &id))?;
    Ok(Json(element))
}

/// Resolve a list of element ids. Unknown ids are left out.
pub async fn resolve_elements(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<IdsRequest>,
) -> Json<Vec<FormElement>> {
    Json(state.intake.library.get_elements(&request.ids).await)
}

pub async fn expand_elements(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<IdsRequest>,
) -> Json<Vec<FieldDefinition>> {
    Json(state.intake.library.expand_element_ids(&request.ids).await)
}

pub async fn search_elements(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Json<Vec<FormElement>> {
    Json(state.intake.library.search_elements(&query.q).await)
}

pub async fn popular_elements(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PopularQuery>,
) -> Json<Vec<FormElement>> {
    let limit = query.limit.unwrap_or(DEFAULT_POPULAR_LIMIT);
    Json(state.intake.library.popular_elements(limit).await)
}

pub async fn statistics(State(state): State<AppState>) -> Json<LibraryStatistics> {
    Json(state.intake.library.statistics().await)
}

/// Check an element without storing it. The body is taken as raw JSON so an
/// element with missing keys is reported in the check, not refused.
pub async fn validate_element(
    ApiJson(element): ApiJson<serde_json::Value>,
) -> Json<ElementCheck> {
    Json(ElementLibrary::validate_element_value(&element))
}

pub async fn add_custom_element(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(new): ApiJson<NewElement>,
) -> Result<(StatusCode, Json<FormElement>), ApiError> {
    let element = state
        .intake
        .library
        .add_custom_element(new, &user.sub)
        .await?;
    Ok((StatusCode::CREATED, Json(element)))
}

pub async fn remove_custom_element(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<String>,
) -> Result<StatusCode, ApiError> {
    if state
        .intake
        .library
        .remove_custom_element(&id, &user.sub)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("custom element not found: {id}")))
    }
}

/// Copy an element under a new name. The copy is returned, not stored.
pub async fn clone_element(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<CloneRequest>,
) -> Result<Json<FormElement>, ApiError> {
    let copy = state
        .intake
        .library
        .clone_element(&id, &request.name)
        .await
        .ok_or_else(|| FormError::not_found("element", &id))?;
    Ok(Json(copy))
}
