//! HTTP 处理器模块

pub mod entity;
pub mod health;
