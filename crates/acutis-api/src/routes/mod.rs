pub mod elements;
pub mod health;
pub mod sessions;
pub mod templates;

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{delete, get, patch, post, put};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::middleware;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        // Templates
        .route("/templates", get(templates::list_templates))
        .route("/templates", post(templates::create_template))
        .route("/templates/expand", post(templates::expand_template))
        .route(
            "/templates/by-unit/{unit}",
            get(templates::get_template_by_unit),
        )
        .route("/templates/{id}", get(templates::get_template))
        .route("/templates/{id}", put(templates::update_template))
        .route("/templates/{id}", delete(templates::delete_template))
        .route(
            "/templates/{id}/duplicate",
            post(templates::duplicate_template),
        )
        .route(
            "/templates/{id}/activate",
            post(templates::activate_template),
        )
        // Element library
        .route("/library", get(elements::get_library))
        .route("/library/categories/{id}", get(elements::get_category))
        .route("/elements", post(elements::add_custom_element))
        .route("/elements/search", get(elements::search_elements))
        .route("/elements/popular", get(elements::popular_elements))
        .route("/elements/statistics", get(elements::statistics))
        .route("/elements/resolve", post(elements::resolve_elements))
        .route("/elements/expand", post(elements::expand_elements))
        .route("/elements/validate", post(elements::validate_element))
        .route("/elements/{id}", get(elements::get_element))
        .route("/elements/{id}", delete(elements::remove_custom_element))
        .route("/elements/{id}/clone", post(elements::clone_element))
        // Sessions
        .route("/sessions", post(sessions::start_session))
        .route("/sessions/{id}", get(sessions::get_session))
        .route("/sessions/{id}", patch(sessions::patch_session))
        .route("/sessions/{id}/template", get(sessions::get_session_template))
        .route("/sessions/{id}/fields/{field_id}", put(sessions::set_field))
        .route("/sessions/{id}/step", get(sessions::step_status))
        .route("/sessions/{id}/advance", post(sessions::advance))
        .route("/sessions/{id}/retreat", post(sessions::retreat))
        .route("/sessions/{id}/complete", post(sessions::complete))
        .layer(axum_mw::from_fn(middleware::auth::require_auth));

    Router::new()
        // Health (no auth)
        .route("/health", get(health::health_check))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(axum_mw::from_fn(middleware::audit::audit_log)),
        )
        .with_state(state)
}
