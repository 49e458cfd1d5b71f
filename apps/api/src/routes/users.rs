//! User registration endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use emporia_core::{User, UserRole};

use crate::error::ApiError;
use crate::services::user_service::NewUser;
use crate::state::AppState;

/// User as exposed through the API. No password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            username: user.username,
            full_name: user.full_name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// POST /users - register a new account. Open to everyone.
pub async fn create(
    State(state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.users.create_user(new_user).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}
