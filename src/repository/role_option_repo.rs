//! Role option repository (角色选项数据访问)

use super::{push_filter, push_page, Repository};
use crate::{error::AppError, models::role_option::RoleOption, pagination::EntityFilter};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

pub struct RoleOptionRepository {
    db: PgPool,
}

impl RoleOptionRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Repository<RoleOption> for RoleOptionRepository {
    #[instrument(skip(self, option), fields(name = %option.name))]
    async fn create(&self, option: RoleOption) -> Result<RoleOption, AppError> {
        let created = sqlx::query_as::<_, RoleOption>(
            r#"
            INSERT INTO role_options (name, link, status)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&option.name)
        .bind(&option.link)
        .bind(option.meta.status)
        .fetch_one(&self.db)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_all(
        &self,
        limit: i64,
        offset: i64,
        filter: Option<EntityFilter>,
    ) -> Result<Vec<RoleOption>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM role_options");
        push_filter(&mut query, filter);
        push_page(&mut query, limit, offset);

        let options = query
            .build_query_as::<RoleOption>()
            .fetch_all(&self.db)
            .await?;

        Ok(options)
    }

    #[instrument(skip(self))]
    async fn get_one(&self, filter: EntityFilter) -> Result<Option<RoleOption>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM role_options");
        push_filter(&mut query, Some(filter));
        query.push(" LIMIT 1");

        let option = query
            .build_query_as::<RoleOption>()
            .fetch_optional(&self.db)
            .await?;

        Ok(option)
    }

    #[instrument(skip(self, option), fields(id = option.meta.id))]
    async fn update(&self, option: RoleOption) -> Result<RoleOption, AppError> {
        // 乐观锁：令牌不匹配时不更新任何行
        let updated = sqlx::query_as::<_, RoleOption>(
            r#"
            UPDATE role_options
            SET
                name = $3,
                link = $4,
                status = $5,
                created_at = $6,
                updated_at = $7
            WHERE id = $1 AND row_version = $2
            RETURNING *
            "#,
        )
        .bind(option.meta.id)
        .bind(option.meta.row_version)
        .bind(&option.name)
        .bind(&option.link)
        .bind(option.meta.status)
        .bind(option.meta.created_at)
        .bind(option.meta.updated_at)
        .fetch_optional(&self.db)
        .await?;

        updated.ok_or(AppError::Concurrency)
    }
}
