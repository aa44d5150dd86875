//! Registration and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{LoginResponse, RegisterUser, Role, User, UserClaims, UserShort},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new account
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        let role = request.role.unwrap_or(Role::User);
        if role == Role::Admin {
            return Err(AppError::Authorization(
                "Administrator accounts cannot be self-registered".to_string(),
            ));
        }
        let has_tax_number = request
            .tax_number
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        if role == Role::Agent && !has_tax_number {
            return Err(AppError::Validation(
                "A tax number is required for agent accounts".to_string(),
            ));
        }

        let email = request.email.trim().to_lowercase();
        if self.repository.users.get_by_email(&email).await?.is_some() {
            return Err(AppError::Duplicate("Email already exists".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: request.name,
            email,
            password: self.hash_password(&request.password)?,
            role,
            tax_number: request.tax_number,
            image: request.image,
            created_at: now,
            updated_at: now,
        };
        self.repository.users.create(&user).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Check credentials and issue a JWT
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        let user = self
            .repository
            .users
            .get_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        let expires_in = self.config.jwt_expiration_hours as i64 * 3600;
        let token = self.create_token(&user, expires_in)?;

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in,
            user: UserShort::from(&user),
        })
    }

    pub async fn me(&self, claims: &UserClaims) -> AppResult<User> {
        self.repository.users.get_by_id(claims.user_id).await
    }

    fn create_token(&self, user: &User, expires_in: i64) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            exp: now + expires_in,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
