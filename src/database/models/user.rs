use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Five-level account role hierarchy: MASTER > ADMIN > SUB_ADMIN > USER > GUEST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Master,
    Admin,
    SubAdmin,
    User,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Master => "MASTER",
            Role::Admin => "ADMIN",
            Role::SubAdmin => "SUB_ADMIN",
            Role::User => "USER",
            Role::Guest => "GUEST",
        }
    }

    /// Role assigned to a newly created account, fixed demotion-by-one from the
    /// creator's role. Accounts created without a creator are guests.
    pub fn for_created_by(creator: Option<Role>) -> Role {
        match creator {
            Some(Role::Master) => Role::Admin,
            Some(Role::Admin) => Role::SubAdmin,
            Some(Role::SubAdmin) => Role::User,
            _ => Role::Guest,
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MASTER" => Ok(Role::Master),
            "ADMIN" => Ok(Role::Admin),
            "SUB_ADMIN" => Ok(Role::SubAdmin),
            "USER" => Ok(Role::User),
            "GUEST" => Ok(Role::Guest),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Roles are stored as TEXT; map through the string representation.
impl sqlx::Type<sqlx::Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl sqlx::Encode<'_, sqlx::Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as sqlx::Encode<'_, sqlx::Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        s.parse::<Role>().map_err(Into::into)
    }
}

/// An account in the role hierarchy. `creator_id` links each account to the
/// account that created it; `status == false` locks out the account and,
/// transitively, everything it created.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub status: bool,
    pub creator_id: Option<Uuid>,
    pub user_limit: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Master, Role::Admin, Role::SubAdmin, Role::User, Role::Guest] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("SUPERVISOR".parse::<Role>().is_err());
    }

    #[test]
    fn creation_demotes_by_one_level() {
        assert_eq!(Role::for_created_by(Some(Role::Master)), Role::Admin);
        assert_eq!(Role::for_created_by(Some(Role::Admin)), Role::SubAdmin);
        assert_eq!(Role::for_created_by(Some(Role::SubAdmin)), Role::User);
        assert_eq!(Role::for_created_by(Some(Role::User)), Role::Guest);
        assert_eq!(Role::for_created_by(Some(Role::Guest)), Role::Guest);
        assert_eq!(Role::for_created_by(None), Role::Guest);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.c".to_string(),
            full_name: "A B".to_string(),
            password_hash: "$2b$10$secret".to_string(),
            role: Role::Admin,
            status: true,
            creator_id: None,
            user_limit: 0,
            location: None,
            avatar: None,
            cover_image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("passwordHash"));
    }
}
