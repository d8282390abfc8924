//! Database repository layer
//! 每类实体一个 Postgres 仓储，另有供本地运行与测试使用的内存仓储

pub mod memory;
pub mod role_option_repo;
pub mod role_repo;
pub mod user_repo;

pub use memory::{InMemoryRepository, Relations, RoleOptionLinks, UserRoleLink};
pub use role_option_repo::*;
pub use role_repo::*;
pub use user_repo::*;

use crate::{error::AppError, models::Entity, pagination::EntityFilter};
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

/// 实体持久化接口
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// 插入实体；已存在的关联实体只按 id 引用
    async fn create(&self, entity: E) -> Result<E, AppError>;

    /// 按 id 排序，先跳过 `offset` 条再取 `limit` 条
    async fn get_all(
        &self,
        limit: i64,
        offset: i64,
        filter: Option<EntityFilter>,
    ) -> Result<Vec<E>, AppError>;

    async fn get_one(&self, filter: EntityFilter) -> Result<Option<E>, AppError>;

    /// 以实体携带的令牌为条件整行替换；令牌不匹配返回 `AppError::Concurrency`
    async fn update(&self, entity: E) -> Result<E, AppError>;

    /// 软删除写入与更新相同，仅状态不同
    async fn delete(&self, entity: E) -> Result<(), AppError> {
        self.update(entity).await.map(|_| ())
    }
}

/// 追加 WHERE 条件
pub(crate) fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: Option<EntityFilter>) {
    match filter {
        Some(EntityFilter::Id(id)) => {
            query.push(" WHERE id = ").push_bind(id);
        }
        Some(EntityFilter::Status(status)) => {
            query.push(" WHERE status = ").push_bind(status);
        }
        None => {}
    }
}

/// 追加稳定排序与分页
pub(crate) fn push_page(query: &mut QueryBuilder<'_, Postgres>, limit: i64, offset: i64) {
    query
        .push(" ORDER BY id OFFSET ")
        .push_bind(offset)
        .push(" LIMIT ")
        .push_bind(limit);
}
