//! 分页与过滤参数

use serde::Deserialize;
use std::collections::BTreeMap;

pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_OFFSET: i64 = 0;

const LIMIT_MESSAGE: &str = "Limit param must be a positive number.";
const OFFSET_MESSAGE: &str = "Offset param must be zero or a positive number.";
const STATUS_MESSAGE: &str = "Status param must be true or false.";

/// 原始查询串 `?status=&limit=&offset=`，取值在 `parse` 中逐项校验
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    pub status: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PaginationQuery {
    /// 解析并校验；空值视为未提供，每个无效参数各给出一条消息
    pub fn parse(&self) -> Result<PaginationParams, BTreeMap<String, Vec<String>>> {
        let mut errors = BTreeMap::new();

        let status = match present(&self.status) {
            None => None,
            Some(value) if value.eq_ignore_ascii_case("true") => Some(true),
            Some(value) if value.eq_ignore_ascii_case("false") => Some(false),
            Some(_) => {
                errors.insert("status".to_string(), vec![STATUS_MESSAGE.to_string()]);
                None
            }
        };
        let limit = parse_number(&self.limit, DEFAULT_LIMIT, "limit", LIMIT_MESSAGE, &mut errors);
        let offset = parse_number(
            &self.offset,
            DEFAULT_OFFSET,
            "offset",
            OFFSET_MESSAGE,
            &mut errors,
        );

        let params = PaginationParams {
            status,
            limit,
            offset,
        };
        if let Err(range_errors) = params.validate() {
            for (field, messages) in range_errors {
                errors.entry(field).or_insert(messages);
            }
        }

        if errors.is_empty() {
            Ok(params)
        } else {
            Err(errors)
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number(
    value: &Option<String>,
    default: i64,
    field: &str,
    message: &str,
    errors: &mut BTreeMap<String, Vec<String>>,
) -> i64 {
    match present(value) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            errors.insert(field.to_string(), vec![message.to_string()]);
            default
        }),
    }
}

/// 校验后的列表参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// 为空时不过滤状态
    pub status: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            status: None,
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

impl PaginationParams {
    /// 校验 limit > 0 且 offset >= 0，返回按字段分组的错误
    pub fn validate(&self) -> Result<(), BTreeMap<String, Vec<String>>> {
        let mut errors = BTreeMap::new();

        if self.limit <= 0 {
            errors.insert("limit".to_string(), vec![LIMIT_MESSAGE.to_string()]);
        }
        if self.offset < 0 {
            errors.insert("offset".to_string(), vec![OFFSET_MESSAGE.to_string()]);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn filter(&self) -> Option<EntityFilter> {
        self.status.map(EntityFilter::Status)
    }
}

/// 持久层支持的过滤条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityFilter {
    Id(i64),
    Status(bool),
}

impl EntityFilter {
    pub fn matches(&self, id: i64, status: bool) -> bool {
        match *self {
            EntityFilter::Id(expected) => id == expected,
            EntityFilter::Status(expected) => status == expected,
        }
    }
}
