//! 统一错误模型
//! 三层共享的失败类型：持久层产生存储类错误，业务层只产生 NotFound / AlreadyDeleted，
//! 边界层负责最终分类（见 `response::ApiResponse::from_error`）。

use axum::http::StatusCode;
use thiserror::Error;

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// The referenced record does not exist.
    #[error("Resource not found")]
    NotFound,

    /// Delete was requested for a record that is already inactive.
    #[error("Record is already deleted")]
    AlreadyDeleted,

    /// The presented row version no longer matches the stored one.
    #[error("Record was modified by another caller")]
    Concurrency,

    /// A natural key collided with an existing row.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String, message: String },

    /// The store's connection budget was exhausted.
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::AlreadyDeleted | AppError::Concurrency => StatusCode::CONFLICT,
            AppError::UniqueViolation { .. } => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound => "Data not found.".to_string(),
            AppError::AlreadyDeleted => "The record is already deleted.".to_string(),
            AppError::Concurrency => "The record has been modified by another user.".to_string(),
            AppError::UniqueViolation { .. } => "Duplicity of indexes.".to_string(),
            AppError::Timeout(_) => "Timeout.".to_string(),
            AppError::Database(_) | AppError::Internal(_) => {
                "Internal Server Error.".to_string()
            }
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    pub fn internal_error(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

/// 从 sqlx::Error 转换，识别连接池超时与唯一约束冲突
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => {
                AppError::Timeout("connection pool acquire timed out".to_string())
            }
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or_default().to_string(),
                    message: db_err.message().to_string(),
                }
            }
            other => AppError::Database(other),
        }
    }
}
