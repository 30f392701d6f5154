use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, models::MemberId};

/// Header set by the gateway after it has authenticated the caller
pub const MEMBER_ID_HEADER: &str = "x-member-id";

/// The authenticated member making the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedMember(pub MemberId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedMember
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(MEMBER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<MemberId>().ok())
            .filter(|id| *id > 0)
            .map(AuthenticatedMember)
            .ok_or_else(|| AppError::Unauthorized("Missing or invalid member identity".to_string()))
    }
}
