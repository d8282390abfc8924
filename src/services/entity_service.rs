//! 实体业务服务
//! 软删除前置条件、不可设置字段的继承、更新时间刷新与 DTO 映射

use crate::{
    error::AppError,
    models::Entity,
    pagination::{EntityFilter, PaginationParams},
    repository::Repository,
};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct EntityService<E: Entity> {
    repo: Arc<dyn Repository<E>>,
}

impl<E: Entity> Clone for EntityService<E> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<E: Entity> EntityService<E> {
    pub fn new(repo: Arc<dyn Repository<E>>) -> Self {
        Self { repo }
    }

    /// 创建实体，状态为激活，生成字段由存储层分配；返回新 id 与表示
    #[instrument(skip(self, dto), fields(entity = E::NAME))]
    pub async fn create(&self, dto: E::CreateDto) -> Result<(i64, E::Dto), AppError> {
        let entity = E::from_create(dto)?;
        let created = self.repo.create(entity).await?;
        let id = created.meta().id;

        info!(id, "{} created", E::NAME);
        Ok((id, created.into_dto()))
    }

    #[instrument(skip(self), fields(entity = E::NAME))]
    pub async fn get_all(&self, params: PaginationParams) -> Result<Vec<E::Dto>, AppError> {
        let entities = self
            .repo
            .get_all(params.limit, params.offset, params.filter())
            .await?;

        Ok(entities.into_iter().map(Entity::into_dto).collect())
    }

    #[instrument(skip(self), fields(entity = E::NAME))]
    pub async fn get_by_id(&self, id: i64) -> Result<E::Dto, AppError> {
        self.repo
            .get_one(EntityFilter::Id(id))
            .await?
            .map(Entity::into_dto)
            .ok_or(AppError::NotFound)
    }

    /// 以请求内容整体替换记录，状态、创建时间等由已存储记录带入
    #[instrument(skip(self, dto), fields(entity = E::NAME))]
    pub async fn update(&self, dto: E::UpdateDto) -> Result<E::Dto, AppError> {
        let mut entity = E::from_update(dto);
        let id = entity.meta().id;

        let stored = self
            .repo
            .get_one(EntityFilter::Id(id))
            .await?
            .ok_or(AppError::NotFound)?;

        entity.carry_over(&stored);
        entity.meta_mut().touch();

        let updated = self.repo.update(entity).await?;

        info!(id, "{} updated", E::NAME);
        Ok(updated.into_dto())
    }

    /// 软删除：仅将状态置为停用，使用已存储的令牌
    #[instrument(skip(self), fields(entity = E::NAME))]
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut entity = self
            .repo
            .get_one(EntityFilter::Id(id))
            .await?
            .ok_or(AppError::NotFound)?;

        if !entity.meta().is_active() {
            return Err(AppError::AlreadyDeleted);
        }

        let meta = entity.meta_mut();
        meta.status = false;
        meta.touch();

        self.repo.delete(entity).await?;

        info!(id, "{} deleted", E::NAME);
        Ok(())
    }
}
