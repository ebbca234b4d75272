use axum::{
    extract::{Extension, Path, Query},
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::lease::{Lease, LeaseChain};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::lease_service::DeleteOutcome;
use crate::services::LeaseService;

/// GET /api/v1/lease - all of the caller's lease chains, grouped
pub async fn lease_get(Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<LeaseChain>> {
    let service = LeaseService::new().await.map_err(ApiError::from)?;
    let chains = service.list_grouped(auth.user_id).await?;
    Ok(ApiResponse::success(chains))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementQuery {
    pub end_date: Option<NaiveDate>,
}

/// GET /api/v1/lease/movement?endDate= - chains already started by the window end
pub async fn lease_movement(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<MovementQuery>,
) -> ApiResult<Vec<LeaseChain>> {
    let end_date = query
        .end_date
        .ok_or_else(|| ApiError::bad_request("endDate query parameter is required"))?;

    let service = LeaseService::new().await.map_err(ApiError::from)?;
    let chains = service.list_movement(auth.user_id, end_date).await?;
    Ok(ApiResponse::success(chains))
}

/// POST /api/v1/lease - bulk create
pub async fn lease_post(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Vec<Lease>> {
    let service = LeaseService::new().await.map_err(ApiError::from)?;
    let created = service.create_bulk(payload, Some(auth.user_id)).await?;
    Ok(ApiResponse::created(created).with_message("Leases created successfully"))
}

/// PUT /api/v1/lease/modify/:id - versioning modification: supersedes the
/// existing version and returns its successor
pub async fn lease_modify(Path(id): Path<Uuid>, Json(payload): Json<Value>) -> ApiResult<Lease> {
    let service = LeaseService::new().await.map_err(ApiError::from)?;
    let new_version = service.modify(id, payload).await?;
    Ok(ApiResponse::created(new_version).with_message("Lease modified successfully"))
}

/// PUT /api/v1/lease/:id - direct field patch (no new version)
pub async fn lease_put(Path(id): Path<Uuid>, Json(payload): Json<Value>) -> ApiResult<Lease> {
    let service = LeaseService::new().await.map_err(ApiError::from)?;
    let updated = service.update(id, payload).await?;
    Ok(ApiResponse::success(updated).with_message("Lease updated successfully"))
}

/// DELETE /api/v1/lease/:id - delete a version, reactivating its predecessor
pub async fn lease_delete(Path(id): Path<Uuid>) -> ApiResult<DeleteOutcome> {
    let service = LeaseService::new().await.map_err(ApiError::from)?;
    let outcome = service.delete(id).await?;
    Ok(ApiResponse::success(outcome).with_message("Lease deleted successfully"))
}
