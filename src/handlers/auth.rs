use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UserService;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/user/login - authenticate and receive a bearer token.
///
/// Sign-in succeeds only if every ancestor in the caller's creator chain is
/// active; see `verify_creator_chain`.
pub async fn login_post(Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    let (Some(email), Some(password)) = (payload.email.as_deref(), payload.password.as_deref())
    else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let service = UserService::new().await.map_err(ApiError::from)?;
    let signed_in = service.sign_in(email, password).await?;

    Ok(ApiResponse::success(json!({
        "role": signed_in.role,
        "token": signed_in.token,
    }))
    .with_message("Login successful"))
}

/// GET /api/user/logout - stateless logout; the client discards its token
pub async fn logout_get() -> ApiResult<()> {
    Ok(ApiResponse::success(()).with_message("Logout successful"))
}
