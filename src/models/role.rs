//! Role domain models

use super::{
    role_option::{RoleOption, RoleOptionDto},
    Entity, RecordMeta, UniqueKey,
};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Role
#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct Role {
    #[sqlx(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    /// Joined through roles_role_options
    #[sqlx(skip)]
    pub role_options: Vec<RoleOption>,
}

/// Role as returned to callers, also accepted as a reference inside a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleDto {
    #[validate(range(min = 1, message = "The field id must be a positive number."))]
    pub id: i64,
    #[validate(length(min = 1, max = 30, message = "The field name must contain at least 1 and up to 30 characters."))]
    pub name: String,
    pub status: bool,
    pub row_version: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    #[validate(nested)]
    pub role_options: Vec<RoleOptionDto>,
}

/// Create role request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleCreateDto {
    #[validate(length(min = 1, max = 30, message = "The field name must contain at least 1 and up to 30 characters."))]
    pub name: String,
    /// Existing options to link, referenced by id
    #[serde(default)]
    #[validate(nested)]
    pub role_options: Vec<RoleOptionDto>,
}

/// Update role request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdateDto {
    #[validate(range(min = 1, message = "The field id must be a positive number."))]
    pub id: i64,
    #[validate(length(min = 1, max = 30, message = "The field name must contain at least 1 and up to 30 characters."))]
    pub name: String,
    pub status: Option<bool>,
    pub row_version: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Links are only written at creation
    #[serde(default)]
    #[validate(nested)]
    pub role_options: Vec<RoleOptionDto>,
}

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        Self {
            id: role.meta.id,
            name: role.name,
            status: role.meta.status,
            row_version: role.meta.row_version,
            created_at: role.meta.created_at,
            updated_at: role.meta.updated_at,
            role_options: role.role_options.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<RoleDto> for Role {
    fn from(dto: RoleDto) -> Self {
        Self {
            meta: RecordMeta {
                id: dto.id,
                status: dto.status,
                row_version: dto.row_version,
                created_at: dto.created_at,
                updated_at: dto.updated_at,
            },
            name: dto.name,
            role_options: dto.role_options.into_iter().map(Into::into).collect(),
        }
    }
}

pub const ROLE_UNIQUE_KEYS: &[UniqueKey] = &[UniqueKey {
    constraint: "ix_uq_roles_name",
    field: "name",
    message: "The name of the role already exists.",
}];

impl Entity for Role {
    const NAME: &'static str = "role";
    const ROUTE: &'static str = "/api/role";
    const UNIQUE_KEYS: &'static [UniqueKey] = ROLE_UNIQUE_KEYS;

    type Dto = RoleDto;
    type CreateDto = RoleCreateDto;
    type UpdateDto = RoleUpdateDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn from_create(dto: RoleCreateDto) -> Result<Self, AppError> {
        Ok(Self {
            meta: RecordMeta::new(),
            name: dto.name,
            role_options: dto.role_options.into_iter().map(Into::into).collect(),
        })
    }

    fn from_update(dto: RoleUpdateDto) -> Self {
        let mut meta = RecordMeta::new();
        meta.id = dto.id;
        meta.row_version = dto.row_version;
        Self {
            meta,
            name: dto.name,
            role_options: dto.role_options.into_iter().map(Into::into).collect(),
        }
    }

    fn carry_over(&mut self, stored: &Self) {
        self.meta.status = stored.meta.status;
        self.meta.created_at = stored.meta.created_at;
        self.role_options = stored.role_options.clone();
    }

    fn into_dto(self) -> RoleDto {
        self.into()
    }

    fn unique_values(&self) -> Vec<(&'static str, String)> {
        vec![("ix_uq_roles_name", self.name.clone())]
    }
}
