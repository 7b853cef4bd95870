// rest/caller.rs — bearer-token extractor.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use std::sync::Arc;

use super::error::ApiError;
use crate::AppContext;

/// Authenticated caller identity, resolved from the `Authorization: Bearer`
/// header before the handler body runs. Handlers receive the user id as an
/// explicit argument; there is no request-global current-user state.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub i64);

impl FromRequestParts<Arc<AppContext>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized("missing bearer token"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("missing bearer token"))?;
        let user_id = ctx
            .tokens
            .verify(token)
            .ok_or(ApiError::Unauthorized("invalid or expired token"))?;
        Ok(Caller(user_id))
    }
}
