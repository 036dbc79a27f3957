use crate::{
    db::DbPool,
    entities::user::{self, ActiveModel as UserActiveModel, Entity as User},
    errors::ServiceError,
    events::{Event, EventSender},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, ActiveModelTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: Option<String>,
}

/// Account data safe to return over the wire. Never carries the hash.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

const DEFAULT_ROLE: &str = "pharmacist";

/// Operator account management. Passwords are argon2-hashed before any row
/// is written; the hash never leaves this module.
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    fn hash_password(password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::HashError(e.to_string()))
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_user(
        &self,
        request: CreateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        let collision = User::find()
            .filter(user::Column::Email.eq(request.email.clone()))
            .one(db)
            .await?;

        if collision.is_some() {
            return Err(ServiceError::Conflict(format!(
                "An account with email {} already exists",
                request.email
            )));
        }

        let password_hash = Self::hash_password(&request.password)?;

        let user_id = Uuid::new_v4();
        let account = UserActiveModel {
            id: Set(user_id),
            name: Set(request.name),
            email: Set(request.email),
            password_hash: Set(password_hash),
            role: Set(request.role.unwrap_or_else(|| DEFAULT_ROLE.to_string())),
            ..Default::default()
        };

        let model = account.insert(db).await?;

        info!(user_id = %user_id, "User account created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::UserCreated(user_id)).await {
                warn!(error = %e, user_id = %user_id, "Failed to send user created event");
            }
        }

        Ok(Self::to_response(model))
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let db = &*self.db_pool;

        let users = User::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(users.into_iter().map(Self::to_response).collect())
    }

    fn to_response(model: user::Model) -> UserResponse {
        UserResponse {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{password_hash::PasswordHash, PasswordVerifier};

    #[test]
    fn hashed_password_verifies_and_is_not_plaintext() {
        let hash = UserService::hash_password("correct horse battery").unwrap();
        assert_ne!(hash, "correct horse battery");

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"correct horse battery", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong password", &parsed)
            .is_err());
    }
}
