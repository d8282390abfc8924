//! User domain models

use super::{
    role::{Role, RoleDto},
    Entity, RecordMeta, UniqueKey,
};
use crate::{
    error::AppError,
    password::{validate_password_policy, validate_username_policy, PasswordHasher},
};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

static DIGITS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9()\-. ]+$").unwrap());

/// User
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    #[sqlx(flatten)]
    pub meta: RecordMeta,
    pub dni: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub phone: String,
    pub email: String,
    pub username: String,
    /// Argon2id hash, never serialized
    pub password: String,
    pub active_session: bool,
    pub role_id: i64,
    #[sqlx(skip)]
    pub role: Role,
}

/// User as returned to callers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub dni: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub phone: String,
    pub email: String,
    pub username: String,
    pub active_session: bool,
    pub status: bool,
    pub row_version: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub role: RoleDto,
}

/// Create user request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateDto {
    #[validate(
        length(equal = 10, message = "The field dni must contain exactly 10 digits."),
        regex(path = *DIGITS_REGEX, message = "The field dni must contain only numbers.")
    )]
    pub dni: String,
    #[validate(length(min = 1, max = 60, message = "The field firstName must be a maximum of 60 characters."))]
    pub first_name: String,
    #[validate(length(min = 1, max = 60, message = "The field lastName must be a maximum of 60 characters."))]
    pub last_name: String,
    pub birth_date: NaiveDate,
    #[validate(
        length(equal = 10, message = "The field phone must contain exactly 10 digits."),
        regex(path = *PHONE_REGEX, message = "The field phone is not a valid phone number.")
    )]
    pub phone: String,
    #[validate(
        length(min = 8, max = 60, message = "The field username is not a valid username."),
        custom(function = "validate_username_policy", message = "The field username is not a valid username.")
    )]
    pub username: String,
    #[validate(
        email(message = "The field email is not a valid email."),
        length(min = 1, max = 60, message = "The field email must be a maximum of 60 characters.")
    )]
    pub email: String,
    #[validate(
        length(min = 8, max = 16, message = "The field password is not a valid password."),
        custom(function = "validate_password_policy", message = "The field password is not a valid password.")
    )]
    pub password: String,
    #[validate(nested)]
    pub role: RoleDto,
}

/// Update user request; the password is not part of it
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateDto {
    #[validate(range(min = 1, message = "The field id must be a positive number."))]
    pub id: i64,
    #[validate(
        length(equal = 10, message = "The field dni must contain exactly 10 digits."),
        regex(path = *DIGITS_REGEX, message = "The field dni must contain only numbers.")
    )]
    pub dni: String,
    #[validate(length(min = 1, max = 60, message = "The field firstName must be a maximum of 60 characters."))]
    pub first_name: String,
    #[validate(length(min = 1, max = 60, message = "The field lastName must be a maximum of 60 characters."))]
    pub last_name: String,
    pub birth_date: NaiveDate,
    #[validate(
        length(equal = 10, message = "The field phone must contain exactly 10 digits."),
        regex(path = *PHONE_REGEX, message = "The field phone is not a valid phone number.")
    )]
    pub phone: String,
    #[validate(
        length(min = 8, max = 60, message = "The field username is not a valid username."),
        custom(function = "validate_username_policy", message = "The field username is not a valid username.")
    )]
    pub username: String,
    #[validate(
        email(message = "The field email is not a valid email."),
        length(min = 1, max = 60, message = "The field email must be a maximum of 60 characters.")
    )]
    pub email: String,
    #[serde(default)]
    pub active_session: bool,
    pub status: Option<bool>,
    pub row_version: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[validate(nested)]
    pub role: RoleDto,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.meta.id,
            dni: user.dni,
            first_name: user.first_name,
            last_name: user.last_name,
            birth_date: user.birth_date,
            phone: user.phone,
            email: user.email,
            username: user.username,
            active_session: user.active_session,
            status: user.meta.status,
            row_version: user.meta.row_version,
            created_at: user.meta.created_at,
            updated_at: user.meta.updated_at,
            role: user.role.into(),
        }
    }
}

pub const USER_UNIQUE_KEYS: &[UniqueKey] = &[
    UniqueKey {
        constraint: "ix_uq_users_dni",
        field: "dni",
        message: "The DNI of the user already exists.",
    },
    UniqueKey {
        constraint: "ix_uq_users_email",
        field: "email",
        message: "The email of the user already exists.",
    },
    UniqueKey {
        constraint: "ix_uq_users_phone",
        field: "phone",
        message: "The phone of the user already exists.",
    },
    UniqueKey {
        constraint: "ix_uq_users_username",
        field: "username",
        message: "The username of the user already exists.",
    },
];

impl Entity for User {
    const NAME: &'static str = "user";
    const ROUTE: &'static str = "/api/user";
    const UNIQUE_KEYS: &'static [UniqueKey] = USER_UNIQUE_KEYS;

    type Dto = UserDto;
    type CreateDto = UserCreateDto;
    type UpdateDto = UserUpdateDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn from_create(dto: UserCreateDto) -> Result<Self, AppError> {
        let password = PasswordHasher::new().hash(&dto.password)?;
        let role: Role = dto.role.into();

        Ok(Self {
            meta: RecordMeta::new(),
            dni: dto.dni,
            first_name: dto.first_name,
            last_name: dto.last_name,
            birth_date: dto.birth_date,
            phone: dto.phone,
            email: dto.email,
            username: dto.username,
            password,
            active_session: false,
            role_id: role.meta.id,
            role,
        })
    }

    fn from_update(dto: UserUpdateDto) -> Self {
        let mut meta = RecordMeta::new();
        meta.id = dto.id;
        meta.row_version = dto.row_version;
        let role: Role = dto.role.into();

        Self {
            meta,
            dni: dto.dni,
            first_name: dto.first_name,
            last_name: dto.last_name,
            birth_date: dto.birth_date,
            phone: dto.phone,
            email: dto.email,
            username: dto.username,
            password: String::new(),
            active_session: dto.active_session,
            role_id: role.meta.id,
            role,
        }
    }

    fn carry_over(&mut self, stored: &Self) {
        self.meta.status = stored.meta.status;
        self.meta.created_at = stored.meta.created_at;
        self.password = stored.password.clone();
    }

    fn into_dto(self) -> UserDto {
        self.into()
    }

    fn unique_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ix_uq_users_dni", self.dni.clone()),
            ("ix_uq_users_email", self.email.clone()),
            ("ix_uq_users_phone", self.phone.clone()),
            ("ix_uq_users_username", self.username.clone()),
        ]
    }
}
