use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::auth::{self, Claims, JwtError};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::user::{Role, User};

/// Bound on the creator-chain walk. Hierarchies are shallow by construction
/// (five role levels); anything deeper means corrupt data.
const MAX_CHAIN_DEPTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("corrupt creator hierarchy: {0}")]
    CorruptHierarchy(String),
    #[error(transparent)]
    Hashing(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Token(#[from] JwtError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Manager(#[from] DatabaseError),
}

/// Store seam for the creator-chain walk, so the traversal is testable
/// against an in-memory directory.
#[async_trait]
pub trait UserLookup {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserError>;
}

#[async_trait]
impl UserLookup for PgPool {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self)
            .await?;
        Ok(user)
    }
}

/// Walk the creator chain upward from `user`. Every ancestor must exist and
/// be active; deactivating an account transitively locks out everything it
/// created. The walk is bounded and cycle-guarded; the authenticating user's
/// own status is not checked here.
pub async fn verify_creator_chain(store: &impl UserLookup, user: &User) -> Result<(), UserError> {
    let mut visited: HashSet<Uuid> = HashSet::new();
    visited.insert(user.id);

    let mut next = user.creator_id;
    let mut depth = 0usize;

    while let Some(creator_id) = next {
        depth += 1;
        if depth > MAX_CHAIN_DEPTH {
            return Err(UserError::CorruptHierarchy(format!(
                "creator chain exceeds depth {}",
                MAX_CHAIN_DEPTH
            )));
        }
        if !visited.insert(creator_id) {
            return Err(UserError::CorruptHierarchy(format!(
                "creator cycle at {}",
                creator_id
            )));
        }

        let creator = store
            .find_by_id(creator_id)
            .await?
            .ok_or_else(|| UserError::NotFound("Parent account not found".to_string()))?;

        if !creator.status {
            return Err(UserError::Forbidden("Parent account is inactive".to_string()));
        }

        next = creator.creator_id;
    }

    Ok(())
}

/// Whether a creator has exhausted its account quota. MASTER accounts are
/// never limited; a zero limit means unlimited.
pub fn limit_reached(creator: &User, created_count: i64) -> bool {
    creator.user_limit > 0 && creator.role != Role::Master && created_count >= creator.user_limit as i64
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccount {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub status: Option<bool>,
    pub user_limit: Option<i32>,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccount {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub status: Option<bool>,
    pub user_limit: Option<i32>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignIn {
    pub role: Role,
    pub token: String,
}

/// Account management plus the sign-in path. All role and hierarchy rules
/// live here; handlers only translate HTTP.
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub async fn new() -> Result<Self, UserError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserError> {
        self.pool.find_by_id(id).await
    }

    /// Sign in: resolve the account, verify the whole creator chain is
    /// active, then verify the password and issue a token.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn, UserError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| UserError::NotFound("User not found".to_string()))?;

        verify_creator_chain(&self.pool, &user).await?;

        if !auth::verify_password(password, &user.password_hash)? {
            return Err(UserError::Unauthorized("Invalid credentials".to_string()));
        }

        let token = auth::generate_jwt(Claims::new(user.id, user.role))?;
        Ok(SignIn {
            role: user.role,
            token,
        })
    }

    /// Create an account under `creator`. Role is fixed demotion-by-one from
    /// the creator's role; non-MASTER creators with a non-zero `user_limit`
    /// are rejected once they have created that many accounts.
    pub async fn create_account(
        &self,
        creator: Option<&User>,
        req: CreateAccount,
        require_location: bool,
    ) -> Result<User, UserError> {
        let (Some(email), Some(full_name), Some(password)) =
            (req.email.as_deref(), req.full_name.as_deref(), req.password.as_deref())
        else {
            return Err(UserError::InvalidInput("Please provide all fields!".to_string()));
        };
        if email.is_empty() || full_name.is_empty() || password.is_empty() {
            return Err(UserError::InvalidInput("Please provide all fields!".to_string()));
        }
        if require_location && req.location.as_deref().map_or(true, str::is_empty) {
            return Err(UserError::InvalidInput("Please provide all fields!".to_string()));
        }

        let email = email.trim().to_lowercase();

        let existing = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            return Err(UserError::Conflict("Email already exists".to_string()));
        }

        if let Some(creator) = creator {
            if creator.user_limit > 0 {
                let created_count = sqlx::query_scalar::<_, i64>(
                    "SELECT count(*) FROM users WHERE creator_id = $1",
                )
                .bind(creator.id)
                .fetch_one(&self.pool)
                .await?;

                if limit_reached(creator, created_count) {
                    return Err(UserError::Forbidden(
                        "Account limit reached for this account".to_string(),
                    ));
                }
            }
        }

        let role = Role::for_created_by(creator.map(|c| c.role));
        let password_hash = auth::hash_password(password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, full_name, password_hash, role, status, creator_id, user_limit, location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&email)
        .bind(full_name.trim())
        .bind(&password_hash)
        .bind(role)
        .bind(req.status.unwrap_or(true))
        .bind(creator.map(|c| c.id))
        .bind(req.user_limit.unwrap_or(0))
        .bind(req.location.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Patch account fields. The password is re-hashed only when supplied and
    /// retained otherwise.
    pub async fn update_account(&self, id: Uuid, req: UpdateAccount) -> Result<User, UserError> {
        let existing = self
            .pool
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound("Account not found".to_string()))?;

        let password_hash = match req.password.as_deref() {
            Some(password) if !password.is_empty() => auth::hash_password(password)?,
            _ => existing.password_hash.clone(),
        };

        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, full_name = $3, password_hash = $4, status = $5,
                user_limit = $6, location = $7, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.email.map(|e| e.to_lowercase()).unwrap_or(existing.email))
        .bind(req.full_name.unwrap_or(existing.full_name))
        .bind(&password_hash)
        .bind(req.status.unwrap_or(existing.status))
        .bind(req.user_limit.unwrap_or(existing.user_limit))
        .bind(req.location.or(existing.location))
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn delete_account(&self, id: Uuid) -> Result<(), UserError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound("Account not found".to_string()));
        }
        Ok(())
    }

    /// All accounts created by `creator_id` (password hashes never leave the
    /// model's serializer).
    pub async fn list_created_by(&self, creator_id: Uuid) -> Result<Vec<User>, UserError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE creator_id = $1 ORDER BY created_at",
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
