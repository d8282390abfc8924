//! 角色与角色选项 API 集成测试（内存存储）

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;

mod common;
use common::{create_role, create_role_option, memory_app, send, send_request};

#[tokio::test]
async fn test_create_role_returns_location() {
    let app = memory_app();
    let option = create_role_option(&app, "Users", "/users").await;

    let (status, headers, json) = send(
        &app,
        Method::POST,
        "/api/role",
        Some(json!({ "name": "Admin", "roleOptions": [option] })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(headers[header::LOCATION], "/api/role/1");
    assert_eq!(json["success"], true);
    assert_eq!(json["status"], 201);
    assert_eq!(json["data"]["id"], 1);
    assert_eq!(json["data"]["name"], "Admin");
    assert_eq!(json["data"]["status"], true);
    assert!(json["data"]["rowVersion"].is_string());
    assert_eq!(json["data"]["roleOptions"][0]["name"], "Users");
    assert!(json["errors"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_role_lifecycle() {
    let app = memory_app();
    let created = create_role(&app, "Admin", vec![]).await;

    // 重名
    let (status, _, json) = send(
        &app,
        Method::POST,
        "/api/role",
        Some(json!({ "name": "Admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["title"], "Duplicity of indexes.");
    assert_eq!(json["errors"]["name"][0], "The name of the role already exists.");

    // 删除
    let (status, _, json) = send(&app, Method::DELETE, "/api/role/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(json.get("data").is_none());

    // 重复删除
    let (status, _, json) = send(&app, Method::DELETE, "/api/role/1", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["title"], "Inconsistent data.");
    assert_eq!(json["detail"], "The record is already deleted.");

    // 已删除的记录仍可读取
    let (status, _, json) = send(&app, Method::GET, "/api/role/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], false);
    assert_ne!(json["data"]["rowVersion"], created["rowVersion"]);

    // 使用创建时的令牌更新
    let (status, _, json) = send(
        &app,
        Method::PUT,
        "/api/role",
        Some(json!({
            "id": 1,
            "name": "Administrators",
            "rowVersion": created["rowVersion"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["detail"], "The record has been modified by another user.");
}

#[tokio::test]
async fn test_update_role_keeps_stored_fields() {
    let app = memory_app();
    let option = create_role_option(&app, "Users", "/users").await;
    let created = create_role(&app, "Admin", vec![option]).await;

    let (status, _, json) = send(
        &app,
        Method::PUT,
        "/api/role",
        Some(json!({
            "id": created["id"],
            "name": "Administrators",
            "status": false,
            "rowVersion": created["rowVersion"],
            "createdAt": "2000-01-01T00:00:00Z",
            "roleOptions": [],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let updated = &json["data"];
    assert_eq!(updated["name"], "Administrators");
    assert_eq!(updated["status"], true);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_ne!(updated["rowVersion"], created["rowVersion"]);
    assert_eq!(updated["roleOptions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_unknown_role_returns_404() {
    let app = memory_app();

    let (status, _, json) = send(
        &app,
        Method::PUT,
        "/api/role",
        Some(json!({
            "id": 42,
            "name": "Ghost",
            "rowVersion": "00000000-0000-0000-0000-000000000000",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["title"], "Data not found.");
}

#[tokio::test]
async fn test_missing_role_returns_404() {
    let app = memory_app();

    let (status, _, json) = send(&app, Method::GET, "/api/role/7", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);

    let (status, _, _) = send(&app, Method::DELETE, "/api/role/7", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_ids_are_rejected() {
    let app = memory_app();

    for uri in ["/api/role/0", "/api/role/-3", "/api/role/abc"] {
        let (status, _, json) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {}", uri);
        assert_eq!(json["title"], "Id not valid.");
        assert_eq!(json["detail"], "Id can not be less than or equal to 0 or null.");
    }

    let (status, _, json) = send(&app, Method::DELETE, "/api/role/0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["title"], "Id not valid.");
}

#[tokio::test]
async fn test_null_and_empty_bodies_are_not_received() {
    let app = memory_app();

    let (status, _, json) =
        send(&app, Method::POST, "/api/role", Some(serde_json::Value::Null)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["title"], "Data not received.");
    assert_eq!(json["detail"], "Object received as null.");

    let (status, _, json) = send(&app, Method::PUT, "/api/role", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["title"], "Data not received.");
}

#[tokio::test]
async fn test_invalid_bodies_report_fields() {
    let app = memory_app();

    let (status, _, json) = send(
        &app,
        Method::POST,
        "/api/role",
        Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["title"], "Data not valid.");
    assert_eq!(json["detail"], "The data has an invalid format.");
    assert!(json["errors"]["name"].is_array());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/role")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\":"))
        .unwrap();
    let (status, _, json) = send_request(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["title"], "Data not valid.");
    assert!(json["errors"]["body"].is_array());
}

#[tokio::test]
async fn test_nested_role_option_errors_use_paths() {
    let app = memory_app();

    let (status, _, json) = send(
        &app,
        Method::POST,
        "/api/role",
        Some(json!({
            "name": "Admin",
            "roleOptions": [{
                "id": 0,
                "name": "Users",
                "link": "/users",
                "status": true,
                "rowVersion": "00000000-0000-0000-0000-000000000000",
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": "2024-01-01T00:00:00Z",
            }],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["errors"]["roleOptions[0].id"][0],
        "The field id must be a positive number."
    );
}

#[tokio::test]
async fn test_list_pagination_and_status_filter() {
    let app = memory_app();
    for name in ["Admin", "Editor", "Viewer"] {
        create_role(&app, name, vec![]).await;
    }
    let (status, _, _) = send(&app, Method::DELETE, "/api/role/2", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, json) = send(&app, Method::GET, "/api/role", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 3);

    let (_, _, json) = send(&app, Method::GET, "/api/role?limit=2&offset=1", None).await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 3]);

    let (_, _, json) = send(&app, Method::GET, "/api/role?status=true", None).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Admin", "Viewer"]);

    let (_, _, json) = send(&app, Method::GET, "/api/role?status=false", None).await;
    assert_eq!(json["data"][0]["name"], "Editor");

    let (_, _, json) = send(&app, Method::GET, "/api/role?offset=10", None).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_query_params() {
    let app = memory_app();

    let (status, _, json) = send(&app, Method::GET, "/api/role?limit=0&offset=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["title"], "Query params invalid.");
    assert_eq!(json["errors"]["limit"][0], "Limit param must be a positive number.");
    assert_eq!(
        json["errors"]["offset"][0],
        "Offset param must be zero or a positive number."
    );

    let (status, _, json) =
        send(&app, Method::GET, "/api/role?limit=abc&offset=x&status=maybe", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["title"], "Query params invalid.");
    assert_eq!(json["errors"]["limit"][0], "Limit param must be a positive number.");
    assert_eq!(
        json["errors"]["offset"][0],
        "Offset param must be zero or a positive number."
    );
    assert_eq!(json["errors"]["status"][0], "Status param must be true or false.");
}

#[tokio::test]
async fn test_empty_status_means_no_filter() {
    let app = memory_app();
    create_role(&app, "Admin", vec![]).await;
    create_role(&app, "Editor", vec![]).await;
    send(&app, Method::DELETE, "/api/role/2", None).await;

    let (status, _, json) = send(&app, Method::GET, "/api/role?status=&limit=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_reads_are_idempotent() {
    let app = memory_app();
    create_role(&app, "Admin", vec![]).await;

    let (_, _, first) = send(&app, Method::GET, "/api/role/1", None).await;
    let (_, _, second) = send(&app, Method::GET, "/api/role/1", None).await;
    assert_eq!(first, second);

    let (_, _, first) = send(&app, Method::GET, "/api/role", None).await;
    let (_, _, second) = send(&app, Method::GET, "/api/role", None).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_role_option_crud() {
    let app = memory_app();
    let created = create_role_option(&app, "Users", "/users").await;
    assert_eq!(created["link"], "/users");

    let (status, _, json) = send(
        &app,
        Method::POST,
        "/api/role-option",
        Some(json!({ "name": "Other", "link": "/users" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["errors"]["link"].is_array());

    let (status, _, json) = send(
        &app,
        Method::PUT,
        "/api/role-option",
        Some(json!({
            "id": created["id"],
            "name": "People",
            "link": "/people",
            "rowVersion": created["rowVersion"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["name"], "People");
    assert_eq!(json["data"]["link"], "/people");

    let (status, _, json) = send(
        &app,
        Method::POST,
        "/api/role-option",
        Some(json!({ "name": "Users", "link": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["errors"]["link"][0],
        "The field link must contain at least 1 and up to 60 characters."
    );
}

#[tokio::test]
async fn test_role_reads_stored_options() {
    let app = memory_app();
    let option = create_role_option(&app, "Users", "/users").await;

    let mut forged = option.clone();
    forged["name"] = json!("Forged");
    let role = create_role(&app, "Admin", vec![forged]).await;
    assert_eq!(role["roleOptions"][0]["name"], "Users");

    let (status, _, _) = send(
        &app,
        Method::PUT,
        "/api/role-option",
        Some(json!({
            "id": option["id"],
            "name": "People",
            "link": "/people",
            "rowVersion": option["rowVersion"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, json) = send(&app, Method::GET, "/api/role/1", None).await;
    assert_eq!(json["data"]["roleOptions"][0]["name"], "People");

    let mut ghost = option.clone();
    ghost["id"] = json!(42);
    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/role",
        Some(json!({ "name": "Editor", "roleOptions": [ghost] })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
