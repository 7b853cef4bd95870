// rest/routes/me.rs — the caller's own profile.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::rest::{caller::Caller, error::ApiError};
use crate::AppContext;

pub async fn get_profile(
    State(ctx): State<Arc<AppContext>>,
    Caller(user_id): Caller,
) -> Result<Json<Value>, ApiError> {
    let user = ctx
        .storage
        .get_user(user_id)
        .await?
        .ok_or(ApiError::NotFound("user not found"))?;
    Ok(Json(json!({
        "email": user.email,
        "name": user.name,
        "language": user.language,
        "isActive": user.is_active,
        "createdAt": user.created_at,
    })))
}

/// PATCH semantics: absent fields are untouched.
#[derive(Debug, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub language: Option<String>,
}

pub async fn update_profile(
    State(ctx): State<Arc<AppContext>>,
    Caller(user_id): Caller,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<Value>, ApiError> {
    if let Some(name) = &patch.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("name must not be empty".to_string()));
        }
    }

    let updated = ctx
        .storage
        .update_user_profile(user_id, patch.name.as_deref(), patch.language.as_deref())
        .await?;
    if !updated {
        return Err(ApiError::NotFound("user not found"));
    }
    Ok(Json(json!({ "message": "profile updated" })))
}
