//! Role option domain models

use super::{Entity, RecordMeta, UniqueKey};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A navigable option (menu entry, page) that roles grant access to
#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct RoleOption {
    #[sqlx(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub link: String,
}

/// Role option as returned to callers, also accepted as a reference inside a role
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleOptionDto {
    #[validate(range(min = 1, message = "The field id must be a positive number."))]
    pub id: i64,
    #[validate(length(min = 1, max = 30, message = "The field name must contain at least 1 and up to 30 characters."))]
    pub name: String,
    #[validate(length(min = 1, max = 60, message = "The field link must contain at least 1 and up to 60 characters."))]
    pub link: String,
    pub status: bool,
    pub row_version: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create role option request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleOptionCreateDto {
    #[validate(length(min = 1, max = 30, message = "The field name must contain at least 1 and up to 30 characters."))]
    pub name: String,
    #[validate(length(min = 1, max = 60, message = "The field link must contain at least 1 and up to 60 characters."))]
    pub link: String,
}

/// Update role option request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleOptionUpdateDto {
    #[validate(range(min = 1, message = "The field id must be a positive number."))]
    pub id: i64,
    #[validate(length(min = 1, max = 30, message = "The field name must contain at least 1 and up to 30 characters."))]
    pub name: String,
    #[validate(length(min = 1, max = 60, message = "The field link must contain at least 1 and up to 60 characters."))]
    pub link: String,
    /// Accepted for compatibility, the stored status always wins
    pub status: Option<bool>,
    pub row_version: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<RoleOption> for RoleOptionDto {
    fn from(option: RoleOption) -> Self {
        Self {
            id: option.meta.id,
            name: option.name,
            link: option.link,
            status: option.meta.status,
            row_version: option.meta.row_version,
            created_at: option.meta.created_at,
            updated_at: option.meta.updated_at,
        }
    }
}

impl From<RoleOptionDto> for RoleOption {
    fn from(dto: RoleOptionDto) -> Self {
        Self {
            meta: RecordMeta {
                id: dto.id,
                status: dto.status,
                row_version: dto.row_version,
                created_at: dto.created_at,
                updated_at: dto.updated_at,
            },
            name: dto.name,
            link: dto.link,
        }
    }
}

pub const ROLE_OPTION_UNIQUE_KEYS: &[UniqueKey] = &[
    UniqueKey {
        constraint: "ix_uq_role_options_name",
        field: "name",
        message: "The name of the role option already exists.",
    },
    UniqueKey {
        constraint: "ix_uq_role_options_link",
        field: "link",
        message: "The link of the role option already exists.",
    },
];

impl Entity for RoleOption {
    const NAME: &'static str = "role_option";
    const ROUTE: &'static str = "/api/role-option";
    const UNIQUE_KEYS: &'static [UniqueKey] = ROLE_OPTION_UNIQUE_KEYS;

    type Dto = RoleOptionDto;
    type CreateDto = RoleOptionCreateDto;
    type UpdateDto = RoleOptionUpdateDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn from_create(dto: RoleOptionCreateDto) -> Result<Self, AppError> {
        Ok(Self {
            meta: RecordMeta::new(),
            name: dto.name,
            link: dto.link,
        })
    }

    fn from_update(dto: RoleOptionUpdateDto) -> Self {
        let mut meta = RecordMeta::new();
        meta.id = dto.id;
        meta.row_version = dto.row_version;
        Self {
            meta,
            name: dto.name,
            link: dto.link,
        }
    }

    fn into_dto(self) -> RoleOptionDto {
        self.into()
    }

    fn unique_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ix_uq_role_options_name", self.name.clone()),
            ("ix_uq_role_options_link", self.link.clone()),
        ]
    }
}
