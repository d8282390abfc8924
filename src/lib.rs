//! 维护服务库
//! 角色、角色选项与用户共享的三层请求管道：处理器 → 服务 → 仓储

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod password;
pub mod repository;
pub mod response;
pub mod routes;
pub mod services;
pub mod telemetry;
