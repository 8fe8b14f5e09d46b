use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Bearer-token principal extraction.
///
/// Token verification happens at the gateway in front of this service; the
/// token presented here is taken as the caller's subject. On success the
/// `AuthUser` is inserted into request extensions for handlers, and copied
/// onto the response for the request log.
pub async fn require_auth(mut req: Request, next: Next) -> Response {
    let sub = match bearer_subject(&req) {
        Some(sub) => sub,
        None => {
            return ApiError::Unauthorized("missing or malformed bearer token".to_string())
                .into_response();
        }
    };

    let user = AuthUser { sub };
    req.extensions_mut().insert(user.clone());

    let mut response = next.run(req).await;
    response.extensions_mut().insert(user);
    response
}

fn bearer_subject(req: &Request) -> Option<String> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Bearer ")?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Authenticated caller.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub sub: String,
}
