mod common;

use common::*;
use pharmacy_api::{
    entities::user::Entity as User,
    errors::ServiceError,
    services::users::{CreateUserRequest, UserService},
};
use sea_orm::EntityTrait;

fn user_service(db: &std::sync::Arc<pharmacy_api::db::DbPool>) -> UserService {
    UserService::new(db.clone(), None)
}

#[tokio::test]
async fn account_creation_hashes_the_password() {
    let db = setup_db().await;
    let users = user_service(&db);

    let created = users
        .create_user(CreateUserRequest {
            name: "Priya Raman".to_string(),
            email: "priya@example.org".to_string(),
            password: "a-long-enough-password".to_string(),
            role: None,
        })
        .await
        .unwrap();

    assert_eq!(created.role, "pharmacist");

    let stored = User::find_by_id(created.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password_hash, "a-long-enough-password");
    assert!(stored.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let db = setup_db().await;
    let users = user_service(&db);

    users
        .create_user(CreateUserRequest {
            name: "First Holder".to_string(),
            email: "shared@example.org".to_string(),
            password: "first-password".to_string(),
            role: Some("admin".to_string()),
        })
        .await
        .unwrap();

    let err = users
        .create_user(CreateUserRequest {
            name: "Second Holder".to_string(),
            email: "shared@example.org".to_string(),
            password: "second-password".to_string(),
            role: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_write() {
    let db = setup_db().await;
    let users = user_service(&db);

    let err = users
        .create_user(CreateUserRequest {
            name: "Shorty".to_string(),
            email: "shorty@example.org".to_string(),
            password: "short".to_string(),
            role: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = users
        .create_user(CreateUserRequest {
            name: "No Email".to_string(),
            email: "not-an-email".to_string(),
            password: "a-long-enough-password".to_string(),
            role: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    assert!(User::find().all(db.as_ref()).await.unwrap().is_empty());
}

#[tokio::test]
async fn listing_returns_accounts_newest_first() {
    let db = setup_db().await;
    let users = user_service(&db);

    for (name, email) in [
        ("Ana Duarte", "ana@example.org"),
        ("Ben Osei", "ben@example.org"),
    ] {
        users
            .create_user(CreateUserRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: "a-long-enough-password".to_string(),
                role: None,
            })
            .await
            .unwrap();
    }

    let listed = users.list_users().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|u| u.email == "ana@example.org"));
    assert!(listed.iter().any(|u| u.email == "ben@example.org"));
}
