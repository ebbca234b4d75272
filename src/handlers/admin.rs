use axum::{
    extract::{Extension, Path},
    response::Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::user::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::{CreateAccount, UpdateAccount};
use crate::services::UserService;

/// GET /api/user/admin (and /api/user/user) - accounts created by the caller
pub async fn accounts_get(Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<User>> {
    let service = UserService::new().await.map_err(ApiError::from)?;
    let accounts = service.list_created_by(auth.user_id).await?;
    Ok(ApiResponse::success(accounts))
}

/// POST /api/user/admin - create an account one role level below the caller
pub async fn admin_post(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateAccount>,
) -> ApiResult<Value> {
    create_account(auth, payload, false, "Admin created successfully").await
}

/// POST /api/user/user - like admin creation, but `location` is required
pub async fn user_post(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateAccount>,
) -> ApiResult<Value> {
    create_account(auth, payload, true, "User created successfully").await
}

async fn create_account(
    auth: AuthUser,
    payload: CreateAccount,
    require_location: bool,
    message: &str,
) -> ApiResult<Value> {
    let service = UserService::new().await.map_err(ApiError::from)?;

    let creator = service
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account not found or unauthorized"))?;

    let created = service
        .create_account(Some(&creator), payload, require_location)
        .await?;

    Ok(ApiResponse::created(json!({
        "id": created.id,
        "role": created.role,
        "location": created.location,
    }))
    .with_message(message))
}

/// PUT /api/user/admin/:id (and /api/user/user/:id) - patch an account
pub async fn account_put(
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAccount>,
) -> ApiResult<User> {
    let service = UserService::new().await.map_err(ApiError::from)?;
    let updated = service.update_account(id, payload).await?;
    Ok(ApiResponse::success(updated).with_message("Account updated successfully"))
}

/// DELETE /api/user/admin/:id (and /api/user/user/:id) - delete an account
pub async fn account_delete(Path(id): Path<Uuid>) -> ApiResult<()> {
    let service = UserService::new().await.map_err(ApiError::from)?;
    service.delete_account(id).await?;
    Ok(ApiResponse::success(()).with_message("Account deleted successfully"))
}
