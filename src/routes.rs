//! 路由注册
//! 按配置挂载实体服务并应用中间件

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer};

use crate::{
    config::{SERVICE_ROLE, SERVICE_ROLE_OPTION, SERVICE_USER},
    handlers::{self, entity::entity_routes},
    middleware::AppState,
};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;

    // 公开端点（健康检查）
    let mut router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .with_state(state.clone());

    // 每个实体族可单独部署
    if server.serves(SERVICE_ROLE) {
        router = router.merge(entity_routes(state.role_service.clone()));
    }
    if server.serves(SERVICE_ROLE_OPTION) {
        router = router.merge(entity_routes(state.role_option_service.clone()));
    }
    if server.serves(SERVICE_USER) {
        router = router.merge(entity_routes(state.user_service.clone()));
    }

    tracing::info!(services = ?server.services, "Routes registered");

    router
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(server.body_limit_bytes))
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
}
