//! Acting-user context propagation
//!
//! Authentication is handled by the surrounding application; mutating
//! calls into the engine identify the acting user through the
//! `x-actor-id` header so ledger entries and payments carry a
//! `created_by`. This extractor only propagates that context.

use axum::{
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{ErrorDetail, ErrorResponse};

/// Header carrying the acting user's id
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Extractor for the acting user on mutating endpoints
#[derive(Clone, Copy, Debug)]
pub struct Actor(pub Uuid);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(Actor)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail {
                        code: "VALIDATION_ERROR".to_string(),
                        message: format!("Missing or invalid {} header", ACTOR_HEADER),
                        field: Some(ACTOR_HEADER.to_string()),
                    },
                };
                (StatusCode::BAD_REQUEST, Json(error))
            })
    }
}
