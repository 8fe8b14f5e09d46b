use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::middleware::auth::AuthUser;

/// Logs every API request as a structured `api_request` event.
pub async fn audit_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let user = response
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.sub.clone())
        .unwrap_or_default();
    tracing::info!(
        method = %method,
        path = %uri,
        status = status,
        user_sub = %user,
        "api_request"
    );

    response
}
