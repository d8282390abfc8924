//! HTTP 中间件
//! 应用状态与请求追踪

use crate::{
    config::AppConfig,
    models::{role::Role, role_option::RoleOption, user::User},
    repository::{
        InMemoryRepository, Repository, RoleOptionLinks, RoleOptionRepository, RoleRepository,
        UserRepository, UserRoleLink,
    },
    services::EntityService,
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 服务使用 Arc 包装，多个请求共享同一实例
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// 内存后端时为空
    pub db: Option<PgPool>,
    pub role_service: Arc<EntityService<Role>>,
    pub role_option_service: Arc<EntityService<RoleOption>>,
    pub user_service: Arc<EntityService<User>>,
}

impl AppState {
    /// 有连接池时使用 Postgres 仓储，否则使用内存仓储
    pub fn new(config: AppConfig, db: Option<PgPool>) -> Self {
        let (role_repo, role_option_repo, user_repo): (
            Arc<dyn Repository<Role>>,
            Arc<dyn Repository<RoleOption>>,
            Arc<dyn Repository<User>>,
        ) = match &db {
            Some(pool) => (
                Arc::new(RoleRepository::new(pool.clone())),
                Arc::new(RoleOptionRepository::new(pool.clone())),
                Arc::new(UserRepository::new(pool.clone())),
            ),
            None => {
                // 关联按 id 从同一内存存储加载
                let options = Arc::new(InMemoryRepository::<RoleOption>::new());
                let roles = Arc::new(
                    InMemoryRepository::<Role>::new()
                        .with_relations(Arc::new(RoleOptionLinks::new(options.clone()))),
                );
                let users: Arc<dyn Repository<User>> = Arc::new(
                    InMemoryRepository::<User>::new()
                        .with_relations(Arc::new(UserRoleLink::new(roles.clone()))),
                );
                let roles: Arc<dyn Repository<Role>> = roles;
                let options: Arc<dyn Repository<RoleOption>> = options;
                (roles, options, users)
            }
        };

        Self {
            config,
            db,
            role_service: Arc::new(EntityService::new(role_repo)),
            role_option_service: Arc::new(EntityService::new(role_option_repo)),
            user_service: Arc::new(EntityService::new(user_repo)),
        }
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();

        // 指标标签使用静态字符串
        let status = response.status().as_u16();
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            _ => "OTHER",
        };
        let status_code = match status {
            200 => "200",
            201 => "201",
            400 => "400",
            404 => "404",
            408 => "408",
            409 => "409",
            413 => "413",
            500 => "500",
            _ => "other",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_code)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
