//! User store behaviour through the domain service and the local client.
//!
//! Each test runs on a fresh in-memory SQLite DB with migrations applied.

mod common;

use std::sync::Arc;

use accounts::{
    domain::{
        error::DomainError,
        repo::{DuplicateUsername, UsersRepository},
        service::{Service, ServiceConfig},
    },
    gateways::local::AccountsLocalClient,
    infra::storage::{
        migrations::Migrator,
        sea_orm_repo::{SeaOrmSessionsRepository, SeaOrmUsersRepository},
    },
    AccountsApi, AccountsError, NewUser, User,
};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

async fn create_test_service(config: ServiceConfig) -> Arc<Service> {
    let db = common::test_db().await;
    Migrator::up(db.seaorm(), None)
        .await
        .expect("Failed to run migrations");
    Arc::new(Service::new(
        Arc::new(SeaOrmUsersRepository::new(db.sea())),
        Arc::new(SeaOrmSessionsRepository::new(db.sea())),
        config,
    ))
}

async fn create_test_client() -> Arc<dyn AccountsApi> {
    let service = create_test_service(ServiceConfig::default()).await;
    Arc::new(AccountsLocalClient::new(service))
}

#[tokio::test]
async fn create_user() {
    let client = create_test_client().await;

    let user = client
        .create_user(NewUser::new("testuser", "testuser@example.com", "testpassword"))
        .await
        .unwrap();

    assert_eq!(user.username, "testuser");
    assert_eq!(user.email, "testuser@example.com");
    assert!(client.check_password(&user, "testpassword"));
    assert!(user.is_active);
    assert!(!user.is_staff);
    assert!(!user.is_superuser);
    assert!(user.last_login.is_none());
}

#[tokio::test]
async fn create_superuser() {
    let client = create_test_client().await;

    let admin = client
        .create_superuser(NewUser::new(
            "adminuser",
            "adminuser@example.com",
            "adminpassword",
        ))
        .await
        .unwrap();

    assert_eq!(admin.username, "adminuser");
    assert_eq!(admin.email, "adminuser@example.com");
    assert!(client.check_password(&admin, "adminpassword"));
    assert!(admin.is_active);
    assert!(admin.is_staff);
    assert!(admin.is_superuser);
}

#[tokio::test]
async fn stored_user_keeps_hash_not_plaintext() {
    let client = create_test_client().await;
    let created = client
        .create_user(NewUser::new("reader", "Reader@EXAMPLE.com", "testpassword"))
        .await
        .unwrap();

    let stored = client.get_user(created.id).await.unwrap();
    assert_eq!(stored.id, created.id);
    assert_eq!(stored.username, "reader");
    assert_eq!(stored.password_hash, created.password_hash);
    assert_eq!(stored.email, "Reader@example.com");
    assert!(stored.password_hash.starts_with("$argon2id$"));
    assert!(!stored.password_hash.contains("testpassword"));
}

#[tokio::test]
async fn check_password_is_idempotent_and_rejects_wrong_input() {
    let client = create_test_client().await;
    let user = client
        .create_user(NewUser::new("reader", "", "testpassword"))
        .await
        .unwrap();

    assert!(client.check_password(&user, "testpassword"));
    assert!(client.check_password(&user, "testpassword"));
    assert!(!client.check_password(&user, "wrongpassword"));
    assert!(!client.check_password(&user, ""));

    let mut broken = user.clone();
    broken.password_hash = "not-a-hash".into();
    assert!(!client.check_password(&broken, "testpassword"));
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let client = create_test_client().await;
    client
        .create_user(NewUser::new("reader", "", "testpassword"))
        .await
        .unwrap();

    let err = client
        .create_superuser(NewUser::new("reader", "", "otherpassword"))
        .await
        .unwrap_err();
    assert_eq!(err, AccountsError::conflict("reader"));
}

#[tokio::test]
async fn concurrent_signups_for_one_username_conflict_instead_of_failing() {
    let service = create_test_service(ServiceConfig::default()).await;

    let (a, b) = tokio::join!(
        service.create_user(NewUser::new("reader", "", "testpassword")),
        service.create_user(NewUser::new("reader", "", "otherpassword")),
    );

    let (ok, err) = match (a, b) {
        (Ok(user), Err(e)) | (Err(e), Ok(user)) => (user, e),
        (a, b) => panic!("exactly one sign-up should win: {a:?} / {b:?}"),
    };
    assert_eq!(ok.username, "reader");
    assert!(
        matches!(&err, DomainError::UsernameTaken { username } if username == "reader"),
        "loser should see the taken username, got {err:?}"
    );
}

#[tokio::test]
async fn repository_reports_duplicate_username() {
    let db = common::test_db().await;
    Migrator::up(db.seaorm(), None).await.unwrap();
    let repo = SeaOrmUsersRepository::new(db.sea());

    let user = |id| User {
        id,
        username: "reader".into(),
        email: String::new(),
        password_hash: "x".into(),
        is_active: true,
        is_staff: false,
        is_superuser: false,
        date_joined: chrono::Utc::now(),
        last_login: None,
    };
    repo.insert(user(Uuid::new_v4())).await.unwrap();

    let err = repo.insert(user(Uuid::new_v4())).await.unwrap_err();
    let dup = err
        .downcast_ref::<DuplicateUsername>()
        .expect("unique violation is reported as a duplicate");
    assert_eq!(dup.0, "reader");
}

#[tokio::test]
async fn invalid_input_is_a_validation_error() {
    let client = create_test_client().await;

    for bad in [
        NewUser::new("", "a@example.com", "testpassword"),
        NewUser::new("has space", "a@example.com", "testpassword"),
        NewUser::new("reader", "a@example.com", ""),
    ] {
        let err = client.create_user(bad).await.unwrap_err();
        assert!(matches!(err, AccountsError::Validation { .. }), "{err:?}");
    }
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let client = create_test_client().await;
    let id = uuid::Uuid::new_v4();
    assert_eq!(
        client.get_user(id).await.unwrap_err(),
        AccountsError::not_found(id)
    );
}

#[tokio::test]
async fn authenticate_requires_matching_active_user() {
    let service = create_test_service(ServiceConfig::default()).await;
    service
        .create_user(NewUser::new("reader", "", "testpassword"))
        .await
        .unwrap();

    assert!(service
        .authenticate("reader", "testpassword")
        .await
        .unwrap()
        .is_some());
    assert!(service
        .authenticate("reader", "wrong")
        .await
        .unwrap()
        .is_none());
    assert!(service
        .authenticate("nobody", "testpassword")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn login_opens_session_and_stamps_last_login() {
    let service = create_test_service(ServiceConfig::default()).await;
    let user = service
        .create_user(NewUser::new("reader", "", "testpassword"))
        .await
        .unwrap();

    let session = service.login(&user).await.unwrap();
    assert_eq!(session.key.len(), 64);
    assert_eq!(session.user_id, user.id);

    let current = service
        .user_for_session(&session.key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.id, user.id);
    assert!(current.last_login.is_some());

    service.logout(&session.key).await.unwrap();
    assert!(service
        .user_for_session(&session.key)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn expired_session_resolves_to_nobody() {
    let service = create_test_service(ServiceConfig {
        session_ttl: chrono::Duration::seconds(-1),
        ..ServiceConfig::default()
    })
    .await;
    let user = service
        .create_user(NewUser::new("reader", "", "testpassword"))
        .await
        .unwrap();

    let session = service.login(&user).await.unwrap();
    assert!(service
        .user_for_session(&session.key)
        .await
        .unwrap()
        .is_none());
    assert!(service.user_for_session("unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn domain_errors_name_the_field() {
    let service = create_test_service(ServiceConfig::default()).await;
    let err = service
        .create_user(NewUser::new("reader", "", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "password"));
}
