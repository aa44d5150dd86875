//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A guest who books properties
    User,
    /// A letting agent who owns listings
    Agent,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Agent => "agent",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "agent" => Ok(Role::Agent),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password: String,
    role: String,
    tax_number: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password: row.password,
            role: row.role.parse().map_err(AppError::Internal)?,
            tax_number: row.tax_number,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Full user model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: Role,
    pub tax_number: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public user representation embedded in other views
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserShort {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserShort {
    fn from(user: &User) -> Self {
        UserShort {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    /// Defaults to `user`
    pub role: Option<Role>,
    /// Required when registering as an agent
    pub tax_number: Option<String>,
    pub image: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserShort,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Agents and admins may publish listings
    pub fn require_agent(&self) -> Result<(), AppError> {
        match self.role {
            Role::Agent | Role::Admin => Ok(()),
            Role::User => Err(AppError::Authorization("Agent account required".to_string())),
        }
    }

    /// The caller is `user_id`, or an admin acting on their behalf
    pub fn require_self_or_admin(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.user_id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Forbidden access".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: "guest@example.com".to_string(),
            user_id: Uuid::new_v4(),
            role,
            exp: now + 3600,
            iat: now,
        }
    }

    fn row(role: &str) -> UserRow {
        let now = Utc::now();
        UserRow {
            id: Uuid::new_v4(),
            name: "Karim".to_string(),
            email: "karim@example.com".to_string(),
            password: String::new(),
            role: role.to_string(),
            tax_number: None,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_with_unknown_role_is_rejected() {
        assert_eq!(User::try_from(row("agent")).unwrap().role, Role::Agent);
        assert!(matches!(User::try_from(row("superuser")), Err(AppError::Internal(_))));
    }

    #[test]
    fn test_token_round_trip() {
        let original = claims(Role::Agent);
        let token = original.create_token("secret").unwrap();
        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, original.user_id);
        assert_eq!(parsed.role, Role::Agent);
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn test_role_checks() {
        assert!(claims(Role::User).require_agent().is_err());
        assert!(claims(Role::Agent).require_agent().is_ok());
        assert!(claims(Role::Agent).require_admin().is_err());

        let guest = claims(Role::User);
        assert!(guest.require_self_or_admin(guest.user_id).is_ok());
        assert!(guest.require_self_or_admin(Uuid::new_v4()).is_err());
        assert!(claims(Role::Admin).require_self_or_admin(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Agent".parse::<Role>(), Ok(Role::Agent));
        assert!("owner".parse::<Role>().is_err());
    }
}
