// rest/routes/auth.rs — registration and login.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::rest::error::ApiError;
use crate::{auth, AppContext};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if body.name.trim().is_empty() || body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::Validation(
            "name, email, and password are required".to_string(),
        ));
    }

    // Short-circuit before hashing — a duplicate must not fall through to
    // the insert.
    if ctx.storage.get_user_by_email(&body.email).await?.is_some() {
        return Err(ApiError::Validation("email already registered".to_string()));
    }

    let hash = auth::hash_password(&body.password)?;
    let user = ctx.storage.create_user(&body.email, &body.name, &hash).await?;
    info!(user_id = user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": { "id": user.id, "email": user.email, "name": user.name }
        })),
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    // Unknown email and wrong password are indistinguishable to the client.
    let Some(user) = ctx.storage.get_user_by_email(&body.email).await? else {
        return Err(ApiError::Unauthorized("invalid credentials"));
    };
    if !auth::verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::Unauthorized("invalid credentials"));
    }

    let token = ctx.tokens.issue(user.id, &user.name)?;
    Ok(Json(json!({ "token": token })))
}
