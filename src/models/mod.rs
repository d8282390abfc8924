//! 数据模型模块
//! 三类实体（角色、角色选项、用户）共享同一条请求管道，
//! 管道通过 `Entity` trait 获取每类实体的路由、唯一键与 DTO 映射。

pub mod role;
pub mod role_option;
pub mod user;

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 实体公共字段：标识、软删除状态、并发令牌与时间戳
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RecordMeta {
    pub id: i64,
    pub status: bool,
    pub row_version: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecordMeta {
    /// 新记录：激活状态，令牌与时间戳由存储层分配
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            status: true,
            row_version: Uuid::nil(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 刷新更新时间
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn is_active(&self) -> bool {
        self.status
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// 唯一约束与响应中错误字段的对应关系
#[derive(Debug, Clone, Copy)]
pub struct UniqueKey {
    /// 数据库索引名
    pub constraint: &'static str,
    /// 错误映射中的字段名（camelCase）
    pub field: &'static str,
    pub message: &'static str,
}

/// 一类可维护实体的完整描述
pub trait Entity: std::fmt::Debug + Clone + Send + Sync + 'static {
    /// 日志与追踪中使用的实体名
    const NAME: &'static str;
    /// 路由基础路径，例如 `/api/role`
    const ROUTE: &'static str;
    const UNIQUE_KEYS: &'static [UniqueKey];

    /// 对外返回的表示
    type Dto: Serialize + Send;
    type CreateDto: DeserializeOwned + Validate + Send;
    type UpdateDto: DeserializeOwned + Validate + Send;

    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// 由创建请求构造实体（生成字段尚未赋值）
    fn from_create(dto: Self::CreateDto) -> Result<Self, AppError>;

    /// 由更新请求构造实体，id 与令牌取自请求
    fn from_update(dto: Self::UpdateDto) -> Self;

    /// 将调用方不可设置的字段从已存储记录带入
    fn carry_over(&mut self, stored: &Self) {
        let meta = self.meta_mut();
        meta.status = stored.meta().status;
        meta.created_at = stored.meta().created_at;
    }

    fn into_dto(self) -> Self::Dto;

    /// 各唯一约束当前的取值，(约束名, 值)
    fn unique_values(&self) -> Vec<(&'static str, String)>;
}
