//! 统一响应信封
//! 所有结果（成功或失败）都以 `{success, status, data?, title?, detail?, errors}` 返回

use crate::{error::AppError, models::UniqueKey};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use validator::{ValidationErrors, ValidationErrorsKind};

pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const TITLE_NOT_RECEIVED: &str = "Data not received.";
pub const DETAIL_NOT_RECEIVED: &str = "Object received as null.";
pub const TITLE_NOT_VALID: &str = "Data not valid.";
pub const DETAIL_NOT_VALID: &str = "The data has an invalid format.";
pub const TITLE_QUERY_INVALID: &str = "Query params invalid.";
pub const DETAIL_QUERY_INVALID: &str = "The query params does not have the correct format.";
pub const TITLE_ID_INVALID: &str = "Id not valid.";
pub const DETAIL_ID_INVALID: &str = "Id can not be less than or equal to 0 or null.";
pub const TITLE_NOT_FOUND: &str = "Data not found.";
pub const TITLE_CONFLICT: &str = "Inconsistent data.";
pub const TITLE_DUPLICATE: &str = "Duplicity of indexes.";
pub const TITLE_TIMEOUT: &str = "Timeout.";
pub const TITLE_INTERNAL: &str = "Internal Server Error.";

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub errors: FieldErrors,
    /// 201 响应的 Location 头，不进入响应体
    #[serde(skip)]
    pub location: Option<String>,
}

impl<T> ApiResponse<T> {
    fn success(status: StatusCode, data: Option<T>) -> Self {
        Self {
            success: true,
            status: status.as_u16(),
            data,
            title: None,
            detail: None,
            errors: FieldErrors::new(),
            location: None,
        }
    }

    /// 200 携带数据
    pub fn ok(data: T) -> Self {
        Self::success(StatusCode::OK, Some(data))
    }

    /// 200 无数据
    pub fn empty() -> Self {
        Self::success(StatusCode::OK, None)
    }

    /// 201 携带新建资源与其位置
    pub fn created(data: T, location: String) -> Self {
        let mut response = Self::success(StatusCode::CREATED, Some(data));
        response.location = Some(location);
        response
    }

    pub fn failure(
        status: StatusCode,
        title: &str,
        detail: Option<&str>,
        errors: FieldErrors,
    ) -> Self {
        Self {
            success: false,
            status: status.as_u16(),
            data: None,
            title: Some(title.to_string()),
            detail: detail.map(str::to_string),
            errors,
            location: None,
        }
    }

    pub fn not_received() -> Self {
        Self::failure(
            StatusCode::BAD_REQUEST,
            TITLE_NOT_RECEIVED,
            Some(DETAIL_NOT_RECEIVED),
            FieldErrors::new(),
        )
    }

    pub fn invalid_data(errors: FieldErrors) -> Self {
        Self::failure(
            StatusCode::BAD_REQUEST,
            TITLE_NOT_VALID,
            Some(DETAIL_NOT_VALID),
            errors,
        )
    }

    pub fn invalid_query(errors: FieldErrors) -> Self {
        Self::failure(
            StatusCode::BAD_REQUEST,
            TITLE_QUERY_INVALID,
            Some(DETAIL_QUERY_INVALID),
            errors,
        )
    }

    pub fn invalid_id() -> Self {
        Self::failure(
            StatusCode::BAD_REQUEST,
            TITLE_ID_INVALID,
            Some(DETAIL_ID_INVALID),
            FieldErrors::new(),
        )
    }

    /// 将任意应用错误分类为响应；唯一约束冲突按 `unique_keys` 定位字段
    pub fn from_error(error: AppError, unique_keys: &[UniqueKey]) -> Self {
        let status = error.status_code();
        match &error {
            AppError::NotFound => {
                Self::failure(status, TITLE_NOT_FOUND, None, FieldErrors::new())
            }
            AppError::AlreadyDeleted | AppError::Concurrency => Self::failure(
                status,
                TITLE_CONFLICT,
                Some(error.user_message().as_str()),
                FieldErrors::new(),
            ),
            AppError::UniqueViolation {
                constraint,
                message,
            } => {
                tracing::warn!(constraint = %constraint, "Unique constraint violated");
                Self::failure(
                    status,
                    TITLE_DUPLICATE,
                    None,
                    unique_violation_errors(constraint, message, unique_keys),
                )
            }
            AppError::Timeout(reason) => {
                tracing::warn!(reason = %reason, "Store timed out");
                Self::failure(status, TITLE_TIMEOUT, None, FieldErrors::new())
            }
            AppError::Database(_) | AppError::Internal(_) => {
                // 完整错误只写日志，响应保持通用
                tracing::error!(code = error.code(), error = ?error, "Unhandled application error");
                Self::failure(status, TITLE_INTERNAL, None, FieldErrors::new())
            }
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let location = self
            .location
            .as_deref()
            .and_then(|value| HeaderValue::from_str(value).ok());

        let mut response = (status, Json(self)).into_response();
        if let Some(location) = location {
            response.headers_mut().insert(header::LOCATION, location);
        }
        response
    }
}

/// 匹配约束名定位字段；驱动未给出约束名时退回匹配错误消息
fn unique_violation_errors(
    constraint: &str,
    message: &str,
    unique_keys: &[UniqueKey],
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let matched = unique_keys.iter().filter(|key| {
        if constraint.is_empty() {
            message.contains(key.constraint)
        } else {
            constraint == key.constraint
        }
    });

    for key in matched {
        errors
            .entry(key.field.to_string())
            .or_default()
            .push(key.message.to_string());
    }

    if errors.is_empty() {
        errors.insert(
            "record".to_string(),
            vec!["A record with the same unique values already exists.".to_string()],
        );
    }
    errors
}

/// 将 validator 错误展开为 camelCase 字段路径，嵌套字段使用 `a.b` / `a[0].b`
pub fn validation_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut output = FieldErrors::new();
    collect_validation_errors(errors, "", &mut output);
    output
}

fn collect_validation_errors(errors: &ValidationErrors, prefix: &str, output: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = join_path(prefix, &to_camel_case(field));
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = output.entry(path).or_default();
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("The field {} is not valid.", field));
                    if !messages.contains(&message) {
                        messages.push(message);
                    }
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validation_errors(nested, &path, output);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_errors(nested, &format!("{}[{}]", path, index), output);
                }
            }
        }
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

fn to_camel_case(field: &str) -> String {
    let mut output = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            output.extend(c.to_uppercase());
            upper = false;
        } else {
            output.push(c);
        }
    }
    output
}
