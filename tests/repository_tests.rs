//! 仓库层集成测试
//! 需要 Postgres：`TEST_DATABASE_URL=... cargo test -- --ignored`

use maintainer_service::{
    config::StoreBackend,
    error::AppError,
    models::{role::Role, role_option::RoleOption, user::User, RecordMeta},
    pagination::EntityFilter,
    password::PasswordHasher,
    repository::{Repository, RoleOptionRepository, RoleRepository, UserRepository},
};
use serial_test::serial;
use sqlx::PgPool;
use uuid::Uuid;

mod common;
use common::{create_test_config, setup_test_db};

async fn test_pool() -> PgPool {
    let config = create_test_config(StoreBackend::Postgres);
    setup_test_db(&config).await
}

fn role_option(name: &str, link: &str) -> RoleOption {
    RoleOption {
        meta: RecordMeta::new(),
        name: name.to_string(),
        link: link.to_string(),
    }
}

fn role(name: &str, role_options: Vec<RoleOption>) -> Role {
    Role {
        meta: RecordMeta::new(),
        name: name.to_string(),
        role_options,
    }
}

fn user(suffix: u8, role: &Role) -> User {
    User {
        meta: RecordMeta::new(),
        dni: format!("01020304{:02}", suffix),
        first_name: "Ana".to_string(),
        last_name: "Torres".to_string(),
        birth_date: chrono::NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
        phone: format!("09912345{:02}", suffix),
        email: format!("ana{}@example.com", suffix),
        username: format!("AnaTorres{}", suffix),
        password: PasswordHasher::new().hash("Secret1!").unwrap(),
        active_session: false,
        role_id: role.meta.id,
        role: role.clone(),
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires database connection"]
async fn test_role_option_create_and_find() {
    let pool = test_pool().await;
    let repo = RoleOptionRepository::new(pool);

    let created = repo.create(role_option("Users", "/users")).await.unwrap();
    assert!(created.meta.id > 0);
    assert!(created.meta.status);

    let found = repo
        .get_one(EntityFilter::Id(created.meta.id))
        .await
        .unwrap()
        .expect("Role option not found");
    assert_eq!(found.name, "Users");
    assert_eq!(found.meta.row_version, created.meta.row_version);
}

#[tokio::test]
#[serial]
#[ignore = "requires database connection"]
async fn test_role_option_unique_name() {
    let pool = test_pool().await;
    let repo = RoleOptionRepository::new(pool);

    repo.create(role_option("Users", "/users")).await.unwrap();
    let err = repo.create(role_option("Users", "/other")).await.unwrap_err();

    match err {
        AppError::UniqueViolation { constraint, .. } => {
            assert_eq!(constraint, "ix_uq_role_options_name")
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires database connection"]
async fn test_update_refreshes_token_and_rejects_stale() {
    let pool = test_pool().await;
    let repo = RoleOptionRepository::new(pool);

    let created = repo.create(role_option("Users", "/users")).await.unwrap();

    let mut renamed = created.clone();
    renamed.name = "People".to_string();
    let updated = repo.update(renamed).await.unwrap();
    assert_ne!(updated.meta.row_version, created.meta.row_version);

    let mut stale = created.clone();
    stale.name = "Stale".to_string();
    let err = repo.update(stale).await.unwrap_err();
    assert!(matches!(err, AppError::Concurrency));

    let mut unknown = created.clone();
    unknown.meta.id = 999;
    unknown.meta.row_version = Uuid::new_v4();
    assert!(matches!(
        repo.update(unknown).await.unwrap_err(),
        AppError::Concurrency
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires database connection"]
async fn test_get_all_orders_pages_and_filters() {
    let pool = test_pool().await;
    let repo = RoleOptionRepository::new(pool);

    for i in 0..4 {
        repo.create(role_option(&format!("Option{}", i), &format!("/o{}", i)))
            .await
            .unwrap();
    }
    let mut second = repo.get_one(EntityFilter::Id(2)).await.unwrap().unwrap();
    second.meta.status = false;
    repo.delete(second).await.unwrap();

    let page = repo.get_all(2, 1, None).await.unwrap();
    let ids: Vec<i64> = page.iter().map(|o| o.meta.id).collect();
    assert_eq!(ids, vec![2, 3]);

    let active = repo
        .get_all(10, 0, Some(EntityFilter::Status(true)))
        .await
        .unwrap();
    assert_eq!(active.len(), 3);

    let inactive = repo
        .get_all(10, 0, Some(EntityFilter::Status(false)))
        .await
        .unwrap();
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0].meta.id, 2);
}

#[tokio::test]
#[serial]
#[ignore = "requires database connection"]
async fn test_role_links_existing_options() {
    let pool = test_pool().await;
    let option_repo = RoleOptionRepository::new(pool.clone());
    let role_repo = RoleRepository::new(pool);

    let users = option_repo.create(role_option("Users", "/users")).await.unwrap();
    let roles = option_repo.create(role_option("Roles", "/roles")).await.unwrap();

    let created = role_repo
        .create(role("Admin", vec![users.clone(), roles.clone()]))
        .await
        .unwrap();
    assert_eq!(created.role_options.len(), 2);

    let found = role_repo
        .get_one(EntityFilter::Id(created.meta.id))
        .await
        .unwrap()
        .expect("Role not found");
    let option_ids: Vec<i64> = found.role_options.iter().map(|o| o.meta.id).collect();
    assert_eq!(option_ids, vec![users.meta.id, roles.meta.id]);

    // 关联的选项未被重复插入
    let all_options = option_repo.get_all(10, 0, None).await.unwrap();
    assert_eq!(all_options.len(), 2);
}

#[tokio::test]
#[serial]
#[ignore = "requires database connection"]
async fn test_user_create_and_load_role() {
    let pool = test_pool().await;
    let role_repo = RoleRepository::new(pool.clone());
    let user_repo = UserRepository::new(pool);

    let admin = role_repo.create(role("Admin", vec![])).await.unwrap();
    let created = user_repo.create(user(1, &admin)).await.unwrap();

    let found = user_repo
        .get_one(EntityFilter::Id(created.meta.id))
        .await
        .unwrap()
        .expect("User not found");
    assert_eq!(found.role.meta.id, admin.meta.id);
    assert_eq!(found.role.name, "Admin");
    assert!(PasswordHasher::new().verify("Secret1!", &found.password));

    let err = user_repo.create(user(1, &admin)).await.unwrap_err();
    assert!(matches!(err, AppError::UniqueViolation { .. }));
}
