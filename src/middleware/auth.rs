use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::database::manager::DatabaseManager;
use crate::database::models::user::{Role, User};
use crate::error::ApiError;

/// Authenticated user context extracted from a bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

/// Bearer-token middleware for the lease and period resources: validates the
/// token and injects the user context.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers).map_err(ApiError::unauthorized)?;
    let claims = auth::validate_jwt(&token)
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Role-allowlist middleware for {MASTER, ADMIN} resources.
pub async fn require_admin_roles(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    restrict_to(&[Role::Master, Role::Admin], headers, request, next).await
}

/// Role-allowlist middleware for SUB_ADMIN resources.
pub async fn require_sub_admin(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    restrict_to(&[Role::SubAdmin], headers, request, next).await
}

/// Validate the token, then re-fetch the account so the check runs against
/// the current stored role rather than the role baked into the token.
async fn restrict_to(
    allowed: &[Role],
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers).map_err(ApiError::unauthorized)?;
    let claims = auth::validate_jwt(&token)
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

    let pool = DatabaseManager::pool().await?;
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(claims.sub)
        .fetch_optional(&pool)
        .await
        .map_err(crate::error::sqlx_to_api_error)?
        .ok_or_else(|| ApiError::unauthorized("Account not found or unauthorized"))?;

    if !allowed.contains(&user.role) {
        return Err(ApiError::forbidden("Access denied. Insufficient permissions"));
    }

    request.extensions_mut().insert(AuthUser {
        user_id: user.id,
        role: user.role,
    });
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer ...` header
fn extract_bearer(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer(&headers).unwrap(), "abc.def.ghi");

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert!(extract_bearer(&headers).is_err());

        assert!(extract_bearer(&HeaderMap::new()).is_err());
    }
}
