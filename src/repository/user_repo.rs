//! User repository (用户数据访问)

use super::{push_filter, push_page, role_repo::attach_role_options, Repository};
use crate::{
    error::AppError,
    models::{role::Role, user::User},
    pagination::EntityFilter,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 加载用户所属角色及角色选项
    async fn attach_roles(&self, users: &mut [User]) -> Result<(), AppError> {
        if users.is_empty() {
            return Ok(());
        }
        let mut role_ids: Vec<i64> = users.iter().map(|u| u.role_id).collect();
        role_ids.sort_unstable();
        role_ids.dedup();

        let mut roles = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = ANY($1)")
            .bind(&role_ids)
            .fetch_all(&self.db)
            .await?;
        attach_role_options(&self.db, &mut roles).await?;

        let roles: HashMap<i64, Role> = roles.into_iter().map(|r| (r.meta.id, r)).collect();
        for user in users.iter_mut() {
            if let Some(role) = roles.get(&user.role_id) {
                user.role = role.clone();
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Repository<User> for UserRepository {
    #[instrument(skip(self, user), fields(username = %user.username, role_id = user.role_id))]
    async fn create(&self, user: User) -> Result<User, AppError> {
        // 角色按 id 引用，不重新插入
        let mut created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                dni, first_name, last_name, birth_date, phone, email,
                username, password, active_session, status, role_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&user.dni)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.birth_date)
        .bind(&user.phone)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.active_session)
        .bind(user.meta.status)
        .bind(user.role_id)
        .fetch_one(&self.db)
        .await?;

        self.attach_roles(std::slice::from_mut(&mut created)).await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_all(
        &self,
        limit: i64,
        offset: i64,
        filter: Option<EntityFilter>,
    ) -> Result<Vec<User>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM users");
        push_filter(&mut query, filter);
        push_page(&mut query, limit, offset);

        let mut users = query.build_query_as::<User>().fetch_all(&self.db).await?;
        self.attach_roles(&mut users).await?;

        Ok(users)
    }

    #[instrument(skip(self))]
    async fn get_one(&self, filter: EntityFilter) -> Result<Option<User>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM users");
        push_filter(&mut query, Some(filter));
        query.push(" LIMIT 1");

        let user = query.build_query_as::<User>().fetch_optional(&self.db).await?;

        match user {
            Some(mut user) => {
                self.attach_roles(std::slice::from_mut(&mut user)).await?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, user), fields(id = user.meta.id))]
    async fn update(&self, user: User) -> Result<User, AppError> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                dni = $3,
                first_name = $4,
                last_name = $5,
                birth_date = $6,
                phone = $7,
                email = $8,
                username = $9,
                password = $10,
                active_session = $11,
                status = $12,
                role_id = $13,
                created_at = $14,
                updated_at = $15
            WHERE id = $1 AND row_version = $2
            RETURNING *
            "#,
        )
        .bind(user.meta.id)
        .bind(user.meta.row_version)
        .bind(&user.dni)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.birth_date)
        .bind(&user.phone)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.active_session)
        .bind(user.meta.status)
        .bind(user.role_id)
        .bind(user.meta.created_at)
        .bind(user.meta.updated_at)
        .fetch_optional(&self.db)
        .await?;

        let mut updated = updated.ok_or(AppError::Concurrency)?;
        self.attach_roles(std::slice::from_mut(&mut updated)).await?;
        Ok(updated)
    }
}
