//! Role repository (角色数据访问)

use super::{push_filter, push_page, Repository};
use crate::{
    error::AppError,
    models::{role::Role, role_option::RoleOption},
    pagination::EntityFilter,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

/// 角色与其选项的关联行
#[derive(Debug, sqlx::FromRow)]
struct RoleOptionLink {
    role_id: i64,
    #[sqlx(flatten)]
    option: RoleOption,
}

pub struct RoleRepository {
    db: PgPool,
}

impl RoleRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// 为一组角色加载其角色选项
pub(crate) async fn attach_role_options(db: &PgPool, roles: &mut [Role]) -> Result<(), AppError> {
    if roles.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = roles.iter().map(|r| r.meta.id).collect();

    let links = sqlx::query_as::<_, RoleOptionLink>(
        r#"
        SELECT rro.role_id, ro.*
        FROM roles_role_options rro
        JOIN role_options ro ON ro.id = rro.role_option_id
        WHERE rro.role_id = ANY($1)
        ORDER BY ro.id
        "#,
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let mut by_role: HashMap<i64, Vec<RoleOption>> = HashMap::new();
    for link in links {
        by_role.entry(link.role_id).or_default().push(link.option);
    }
    for role in roles.iter_mut() {
        role.role_options = by_role.remove(&role.meta.id).unwrap_or_default();
    }

    Ok(())
}

#[async_trait]
impl Repository<Role> for RoleRepository {
    #[instrument(skip(self, role), fields(name = %role.name, options = role.role_options.len()))]
    async fn create(&self, role: Role) -> Result<Role, AppError> {
        let mut tx = self.db.begin().await?;

        let mut created = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, status)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(&role.name)
        .bind(role.meta.status)
        .fetch_one(&mut *tx)
        .await?;

        // 已存在的角色选项只写关联行，不重新插入
        for option in &role.role_options {
            sqlx::query(
                r#"
                INSERT INTO roles_role_options (role_id, role_option_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(created.meta.id)
            .bind(option.meta.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        attach_role_options(&self.db, std::slice::from_mut(&mut created)).await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_all(
        &self,
        limit: i64,
        offset: i64,
        filter: Option<EntityFilter>,
    ) -> Result<Vec<Role>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM roles");
        push_filter(&mut query, filter);
        push_page(&mut query, limit, offset);

        let mut roles = query.build_query_as::<Role>().fetch_all(&self.db).await?;
        attach_role_options(&self.db, &mut roles).await?;

        Ok(roles)
    }

    #[instrument(skip(self))]
    async fn get_one(&self, filter: EntityFilter) -> Result<Option<Role>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM roles");
        push_filter(&mut query, Some(filter));
        query.push(" LIMIT 1");

        let role = query.build_query_as::<Role>().fetch_optional(&self.db).await?;

        match role {
            Some(mut role) => {
                attach_role_options(&self.db, std::slice::from_mut(&mut role)).await?;
                Ok(Some(role))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, role), fields(id = role.meta.id))]
    async fn update(&self, role: Role) -> Result<Role, AppError> {
        // 仅替换本行字段，关联行保持不变
        let updated = sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET
                name = $3,
                status = $4,
                created_at = $5,
                updated_at = $6
            WHERE id = $1 AND row_version = $2
            RETURNING *
            "#,
        )
        .bind(role.meta.id)
        .bind(role.meta.row_version)
        .bind(&role.name)
        .bind(role.meta.status)
        .bind(role.meta.created_at)
        .bind(role.meta.updated_at)
        .fetch_optional(&self.db)
        .await?;

        let mut updated = updated.ok_or(AppError::Concurrency)?;
        attach_role_options(&self.db, std::slice::from_mut(&mut updated)).await?;
        Ok(updated)
    }
}
