//! 实体 CRUD 的 HTTP 处理器
//! 三类实体共用同一组处理器，按实体类型实例化

use crate::{
    models::Entity,
    pagination::PaginationQuery,
    response::{validation_errors, ApiResponse, FieldErrors},
    services::EntityService,
};
use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

type ServiceState<E> = State<Arc<EntityService<E>>>;

/// 实体路由：`POST/GET/PUT {base}` 与 `GET/DELETE {base}/{id}`
pub fn entity_routes<E: Entity>(service: Arc<EntityService<E>>) -> Router {
    Router::new()
        .route(E::ROUTE, get(get_all::<E>).post(create::<E>).put(update::<E>))
        .route(
            &format!("{}/{{id}}", E::ROUTE),
            get(get_by_id::<E>).delete(delete::<E>),
        )
        .with_state(service)
}

/// 请求体解析：空体或 `null` 视为未收到，格式错误或校验失败视为无效
fn parse_payload<T, R>(body: &[u8]) -> Result<T, ApiResponse<R>>
where
    T: DeserializeOwned + Validate,
{
    if let Ok(text) = std::str::from_utf8(body) {
        let text = text.trim();
        if text.is_empty() || text == "null" {
            return Err(ApiResponse::not_received());
        }
    }

    let payload: T = serde_json::from_slice(body).map_err(|e| {
        let mut errors = FieldErrors::new();
        errors.insert("body".to_string(), vec![e.to_string()]);
        ApiResponse::invalid_data(errors)
    })?;

    payload
        .validate()
        .map_err(|e| ApiResponse::invalid_data(validation_errors(&e)))?;

    Ok(payload)
}

/// 路径 id 必须为正整数
fn parse_id<R>(id: Result<Path<i64>, PathRejection>) -> Result<i64, ApiResponse<R>> {
    match id {
        Ok(Path(id)) if id > 0 => Ok(id),
        _ => Err(ApiResponse::invalid_id()),
    }
}

/// 创建实体
#[instrument(skip_all, fields(entity = E::NAME))]
pub async fn create<E: Entity>(State(service): ServiceState<E>, body: Bytes) -> ApiResponse<E::Dto> {
    info!("Create requested");
    let payload = match parse_payload::<E::CreateDto, E::Dto>(&body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    let response = match service.create(payload).await {
        Ok((id, dto)) => ApiResponse::created(dto, format!("{}/{}", E::ROUTE, id)),
        Err(e) => ApiResponse::from_error(e, E::UNIQUE_KEYS),
    };
    info!(status = response.status, "Create finished");
    response
}

/// 列出实体
#[instrument(skip_all, fields(entity = E::NAME))]
pub async fn get_all<E: Entity>(
    State(service): ServiceState<E>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> ApiResponse<Vec<E::Dto>> {
    info!("GetAll requested");
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            // 仅重复参数等结构性错误会到达这里
            warn!(error = %e, "Invalid query params");
            let mut errors = FieldErrors::new();
            errors.insert("query".to_string(), vec![e.body_text()]);
            return ApiResponse::invalid_query(errors);
        }
    };
    let params = match query.parse() {
        Ok(params) => params,
        Err(errors) => return ApiResponse::invalid_query(errors),
    };

    let response = match service.get_all(params).await {
        Ok(items) => ApiResponse::ok(items),
        Err(e) => ApiResponse::from_error(e, E::UNIQUE_KEYS),
    };
    info!(status = response.status, "GetAll finished");
    response
}

/// 获取实体详情
#[instrument(skip_all, fields(entity = E::NAME))]
pub async fn get_by_id<E: Entity>(
    State(service): ServiceState<E>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResponse<E::Dto> {
    info!("GetById requested");
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let response = match service.get_by_id(id).await {
        Ok(dto) => ApiResponse::ok(dto),
        Err(e) => ApiResponse::from_error(e, E::UNIQUE_KEYS),
    };
    info!(id, status = response.status, "GetById finished");
    response
}

/// 更新实体，id 位于请求体中
#[instrument(skip_all, fields(entity = E::NAME))]
pub async fn update<E: Entity>(State(service): ServiceState<E>, body: Bytes) -> ApiResponse<E::Dto> {
    info!("Update requested");
    let payload = match parse_payload::<E::UpdateDto, E::Dto>(&body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    let response = match service.update(payload).await {
        Ok(dto) => ApiResponse::ok(dto),
        Err(e) => ApiResponse::from_error(e, E::UNIQUE_KEYS),
    };
    info!(status = response.status, "Update finished");
    response
}

/// 软删除实体
#[instrument(skip_all, fields(entity = E::NAME))]
pub async fn delete<E: Entity>(
    State(service): ServiceState<E>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResponse<()> {
    info!("Delete requested");
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let response = match service.delete(id).await {
        Ok(()) => ApiResponse::empty(),
        Err(e) => ApiResponse::from_error(e, E::UNIQUE_KEYS),
    };
    info!(id, status = response.status, "Delete finished");
    response
}
