//! # User Service
//!
//! Account creation and credential checks.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use emporia_core::validation::{validate_email, validate_password, validate_username};
use emporia_core::{User, UserRole};
use emporia_db::repository::user::generate_user_id;
use emporia_db::Database;

use crate::error::ApiError;
use crate::security::{hash_password, verify_password};

/// Payload for registering a new account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Service for account management.
#[derive(Clone)]
pub struct UserService {
    db: Database,
}

impl UserService {
    /// Creates a new UserService.
    pub fn new(db: Database) -> Self {
        UserService { db }
    }

    /// Creates a new user with validation and password hashing.
    ///
    /// ## Failure
    /// * `Conflict` - email or username already registered
    /// * `BadRequest` - malformed email, short username/password
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, ApiError> {
        validate_email(&new_user.email)?;
        validate_username(&new_user.username)?;
        validate_password(&new_user.password)?;

        let users = self.db.users();

        if users.get_by_email(&new_user.email).await?.is_some() {
            return Err(ApiError::Conflict(format!(
                "Email {} already exists",
                new_user.email
            )));
        }

        if users.get_by_username(&new_user.username).await?.is_some() {
            return Err(ApiError::Conflict(format!(
                "Username {} already exists",
                new_user.username
            )));
        }

        let hashed_password = hash_password(&new_user.password)?;
        let now = Utc::now();

        let user = User {
            id: generate_user_id(),
            email: new_user.email,
            username: new_user.username,
            hashed_password,
            full_name: new_user.full_name,
            role: UserRole::Customer,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        users.insert(&user).await?;

        info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    /// Authenticates a user by email and password.
    ///
    /// Returns `None` on unknown email or wrong password; the two cases
    /// are indistinguishable to the caller on purpose.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, ApiError> {
        let Some(user) = self.db.users().get_by_email(email).await? else {
            return Ok(None);
        };

        if !verify_password(password, &user.hashed_password) {
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Looks a user up by id (used by the auth extractor).
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
        Ok(self.db.users().get_by_id(id).await?)
    }
}
