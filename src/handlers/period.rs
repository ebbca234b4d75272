use axum::{
    extract::Path,
    response::Json,
};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::period::{CreatePeriod, Period, UpdatePeriod};
use crate::error::{sqlx_to_api_error, ApiError};
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/v1/period - list all periods
pub async fn period_get() -> ApiResult<Vec<Period>> {
    let pool = DatabaseManager::pool().await.map_err(ApiError::from)?;

    let periods = sqlx::query_as::<_, Period>("SELECT * FROM periods ORDER BY start_date")
        .fetch_all(&pool)
        .await
        .map_err(sqlx_to_api_error)?;

    Ok(ApiResponse::success(periods))
}

/// POST /api/v1/period - create a period
pub async fn period_post(Json(payload): Json<CreatePeriod>) -> ApiResult<Period> {
    if payload.end_date < payload.start_date {
        return Err(ApiError::bad_request("endDate must not precede startDate"));
    }

    let pool = DatabaseManager::pool().await.map_err(ApiError::from)?;

    let period = sqlx::query_as::<_, Period>(
        "INSERT INTO periods (start_date, end_date, status) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.status)
    .fetch_one(&pool)
    .await
    .map_err(sqlx_to_api_error)?;

    Ok(ApiResponse::created(period).with_message("Period created successfully"))
}

/// PUT /api/v1/period/:id - patch a period
pub async fn period_put(
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePeriod>,
) -> ApiResult<Period> {
    let pool = DatabaseManager::pool().await.map_err(ApiError::from)?;

    let existing = sqlx::query_as::<_, Period>("SELECT * FROM periods WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await
        .map_err(sqlx_to_api_error)?
        .ok_or_else(|| ApiError::not_found("Period not found"))?;

    let start_date = payload.start_date.unwrap_or(existing.start_date);
    let end_date = payload.end_date.unwrap_or(existing.end_date);
    if end_date < start_date {
        return Err(ApiError::bad_request("endDate must not precede startDate"));
    }

    let period = sqlx::query_as::<_, Period>(
        r#"
        UPDATE periods
        SET start_date = $2, end_date = $3, status = $4, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(start_date)
    .bind(end_date)
    .bind(payload.status.unwrap_or(existing.status))
    .fetch_one(&pool)
    .await
    .map_err(sqlx_to_api_error)?;

    Ok(ApiResponse::success(period).with_message("Period updated successfully"))
}

/// DELETE /api/v1/period/:id - delete a period
pub async fn period_delete(Path(id): Path<Uuid>) -> ApiResult<()> {
    let pool = DatabaseManager::pool().await.map_err(ApiError::from)?;

    let result = sqlx::query("DELETE FROM periods WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(sqlx_to_api_error)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Period not found"));
    }

    Ok(ApiResponse::success(()).with_message("Period deleted successfully"))
}
