//! In-memory repository for local runs and tests
//! 与 Postgres 仓储遵守同一契约：唯一约束、并发令牌、按 id 排序的分页、
//! 关联实体按 id 引用并在读取时从存储加载

use super::Repository;
use crate::{
    error::AppError,
    models::{role::Role, role_option::RoleOption, user::User, Entity},
    pagination::EntityFilter,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// 关联实体的加载器，对应外键与连接查询
#[async_trait]
pub trait Relations<E>: Send + Sync {
    /// 用存储中的记录替换实体引用的关联实体；被引用的记录不存在时失败
    async fn load(&self, entity: &mut E) -> Result<(), AppError>;
}

/// Role → RoleOption，经由 roles_role_options
pub struct RoleOptionLinks {
    options: Arc<InMemoryRepository<RoleOption>>,
}

impl RoleOptionLinks {
    pub fn new(options: Arc<InMemoryRepository<RoleOption>>) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Relations<Role> for RoleOptionLinks {
    async fn load(&self, role: &mut Role) -> Result<(), AppError> {
        let mut ids: Vec<i64> = role.role_options.iter().map(|o| o.meta.id).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut options = Vec::with_capacity(ids.len());
        for id in ids {
            let option = self
                .options
                .get_one(EntityFilter::Id(id))
                .await?
                .ok_or_else(|| foreign_key_violation("roles_role_options", id))?;
            options.push(option);
        }
        role.role_options = options;
        Ok(())
    }
}

/// User → Role，经由 users.role_id
pub struct UserRoleLink {
    roles: Arc<InMemoryRepository<Role>>,
}

impl UserRoleLink {
    pub fn new(roles: Arc<InMemoryRepository<Role>>) -> Self {
        Self { roles }
    }
}

#[async_trait]
impl Relations<User> for UserRoleLink {
    async fn load(&self, user: &mut User) -> Result<(), AppError> {
        let role = self
            .roles
            .get_one(EntityFilter::Id(user.role_id))
            .await?
            .ok_or_else(|| foreign_key_violation("users", user.role_id))?;
        user.role = role;
        Ok(())
    }
}

fn foreign_key_violation(table: &str, id: i64) -> AppError {
    AppError::internal_error(&format!(
        "insert or update on table \"{}\" violates foreign key constraint: key {} is not present",
        table, id
    ))
}

struct Table<E> {
    next_id: i64,
    rows: Vec<E>,
}

pub struct InMemoryRepository<E: Entity> {
    table: Mutex<Table<E>>,
    relations: Option<Arc<dyn Relations<E>>>,
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(Table {
                next_id: 1,
                rows: Vec::new(),
            }),
            relations: None,
        }
    }

    /// 写入前校验关联引用，读取时加载关联实体
    pub fn with_relations(mut self, relations: Arc<dyn Relations<E>>) -> Self {
        self.relations = Some(relations);
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Table<E>>, AppError> {
        self.table
            .lock()
            .map_err(|_| AppError::internal_error("in-memory store lock poisoned"))
    }

    async fn load_relations(&self, entity: &mut E) -> Result<(), AppError> {
        match &self.relations {
            Some(relations) => relations.load(entity).await,
            None => Ok(()),
        }
    }

    /// 与除 `skip_id` 外的所有记录（含已停用记录）比较唯一键
    fn check_unique(rows: &[E], entity: &E, skip_id: Option<i64>) -> Result<(), AppError> {
        let values = entity.unique_values();
        for row in rows {
            if Some(row.meta().id) == skip_id {
                continue;
            }
            for (constraint, value) in row.unique_values() {
                if values.iter().any(|(c, v)| *c == constraint && *v == value) {
                    return Err(AppError::UniqueViolation {
                        constraint: constraint.to_string(),
                        message: format!(
                            "duplicate key value violates unique constraint \"{}\"",
                            constraint
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn create(&self, mut entity: E) -> Result<E, AppError> {
        // 关联记录在加锁前解析，锁不跨越 await
        self.load_relations(&mut entity).await?;

        let mut table = self.lock()?;
        Self::check_unique(&table.rows, &entity, None)?;

        let now = Utc::now();
        let id = table.next_id;
        table.next_id += 1;

        let meta = entity.meta_mut();
        meta.id = id;
        meta.row_version = Uuid::new_v4();
        meta.created_at = now;
        meta.updated_at = now;

        table.rows.push(entity.clone());
        Ok(entity)
    }

    async fn get_all(
        &self,
        limit: i64,
        offset: i64,
        filter: Option<EntityFilter>,
    ) -> Result<Vec<E>, AppError> {
        let mut rows: Vec<E> = {
            let table = self.lock()?;
            table
                .rows
                .iter()
                .filter(|row| {
                    filter.map_or(true, |f| f.matches(row.meta().id, row.meta().status))
                })
                .skip(usize::try_from(offset).unwrap_or(0))
                .take(usize::try_from(limit).unwrap_or(0))
                .cloned()
                .collect()
        };

        for row in rows.iter_mut() {
            self.load_relations(row).await?;
        }
        Ok(rows)
    }

    async fn get_one(&self, filter: EntityFilter) -> Result<Option<E>, AppError> {
        let row = {
            let table = self.lock()?;
            table
                .rows
                .iter()
                .find(|row| filter.matches(row.meta().id, row.meta().status))
                .cloned()
        };

        match row {
            Some(mut row) => {
                self.load_relations(&mut row).await?;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, mut entity: E) -> Result<E, AppError> {
        self.load_relations(&mut entity).await?;

        let mut table = self.lock()?;
        let id = entity.meta().id;

        let position = table
            .rows
            .iter()
            .position(|row| {
                row.meta().id == id && row.meta().row_version == entity.meta().row_version
            })
            .ok_or(AppError::Concurrency)?;
        Self::check_unique(&table.rows, &entity, Some(id))?;

        entity.meta_mut().row_version = Uuid::new_v4();
        table.rows[position] = entity.clone();
        Ok(entity)
    }
}
