//! Caller-identity extraction.
//!
//! The identity collaborator authenticates upstream and forwards an opaque
//! actor id plus a role tag in headers; the core trusts them as supplied.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use convoca_core::actor::{Actor, Role};
use convoca_core::error::DomainError;

use crate::error::ApiError;

/// Header carrying the actor's numeric ledger id.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Header carrying the actor's role tag.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Extractor for the caller identity supplied by the identity collaborator.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Actor);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ledger_id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i64>().ok());
        let role = parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Role>().ok());

        match (ledger_id, role) {
            (Some(ledger_id), Some(role)) => Ok(Self(Actor::new(ledger_id, role))),
            _ => Err(ApiError(DomainError::Unauthorized(
                "missing or malformed actor identity".into(),
            ))),
        }
    }
}
