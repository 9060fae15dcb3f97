mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

async fn allowed(app: &common::TestApp, token: &str, page_path: &str, role: &str) -> Value {
    let uri = format!("/page-permissions/check?page_path={}&role={}", page_path, role);
    let res = app.call(Method::GET, &uri, Some(token), None).await;
    res.json()["data"]["allowed"].clone()
}

#[tokio::test]
async fn owners_manage_custom_roles() {
    let app = common::test_app();
    let (owner, _) = app.register("Harbor Counseling", "owner@harbor.test").await;

    let created = app
        .call(
            Method::POST,
            "/roles",
            Some(&owner),
            Some(json!({"role_name": "  Intern ", "role_description": "Supervised clinician"})),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json()["data"]["role_name"], "Intern");

    for name in ["Intern", "admin"] {
        let dup = app
            .call(Method::POST, "/roles", Some(&owner), Some(json!({"role_name": name})))
            .await;
        assert_eq!(dup.status, StatusCode::CONFLICT, "{}", name);
        assert_eq!(dup.json()["error"], "Role name already exists");
    }

    let available = app.call(Method::GET, "/roles/available", Some(&owner), None).await;
    assert_eq!(available.json()["data"], json!(["owner", "admin", "practitioner", "Intern"]));

    let assignable = app.call(Method::GET, "/roles/assignable", Some(&owner), None).await;
    assert_eq!(assignable.json()["data"], json!(["admin", "practitioner", "Intern"]));

    let roles = app.call(Method::GET, "/roles", Some(&owner), None).await;
    let entries = roles.json()["data"].as_array().unwrap().clone();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0]["kind"], "base");
    assert_eq!(entries[3]["kind"], "custom");
}

#[tokio::test]
async fn practitioners_cannot_administer() {
    let app = common::test_app();
    let (_, tenant_id) = app.register("Harbor Counseling", "owner@harbor.test").await;
    let practitioner = common::mint_token(Uuid::new_v4(), tenant_id, "p@harbor.test", "practitioner", false);

    let res = app
        .call(Method::POST, "/roles", Some(&practitioner), Some(json!({"role_name": "Intern"})))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .call(
            Method::POST,
            "/users",
            Some(&practitioner),
            Some(json!({"email": "new@harbor.test", "first_name": "N", "last_name": "P", "role": "admin"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let root = app.call(Method::GET, "/root/tenants", Some(&practitioner), None).await;
    assert_eq!(root.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn adding_users_validates_before_saving() {
    let app = common::test_app();
    let (owner, _) = app.register("Harbor Counseling", "owner@harbor.test").await;

    let bad = app
        .call(
            Method::POST,
            "/users",
            Some(&owner),
            Some(json!({"email": "not-an-email", "first_name": "Jo", "last_name": "Lee", "role": "practitioner"})),
        )
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let added = app
        .call(
            Method::POST,
            "/users",
            Some(&owner),
            Some(json!({"email": "jo@harbor.test", "first_name": "Jo", "last_name": "Lee", "role": "practitioner"})),
        )
        .await;
    assert_eq!(added.status, StatusCode::CREATED);
    assert_eq!(added.json()["data"]["has_password"], false);

    let users = app.call(Method::GET, "/users", Some(&owner), None).await;
    assert_eq!(users.json()["data"].as_array().unwrap().len(), 2);

    let demote = app
        .call(
            Method::POST,
            "/users",
            Some(&owner),
            Some(json!({"email": "owner@harbor.test", "first_name": "Avery", "last_name": "Stone", "role": "practitioner"})),
        )
        .await;
    assert_eq!(demote.status, StatusCode::CONFLICT);

    let users = app.call(Method::GET, "/users", Some(&owner), None).await;
    let roles: Vec<Value> = users.json()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["role"].clone())
        .collect();
    assert!(roles.contains(&json!("owner")));
}

#[tokio::test]
async fn page_permissions_toggle_and_check() {
    let app = common::test_app();
    let (owner, _) = app.register("Harbor Counseling", "owner@harbor.test").await;

    let page = app
        .call(
            Method::POST,
            "/page-permissions",
            Some(&owner),
            Some(json!({"page_path": "/billing", "page_name": "Billing", "roles": ["admin"]})),
        )
        .await;
    assert_eq!(page.status, StatusCode::CREATED);
    let page_id = page.json()["data"]["id"].as_str().unwrap().to_string();

    assert_eq!(allowed(&app, &owner, "/billing", "practitioner").await, json!(false));

    let toggled = app
        .call(
            Method::POST,
            &format!("/page-permissions/{}/toggle", page_id),
            Some(&owner),
            Some(json!({"role": "practitioner", "current_roles": ["admin"]})),
        )
        .await;
    assert_eq!(toggled.json()["data"], json!(["admin", "practitioner"]));
    assert_eq!(allowed(&app, &owner, "/billing", "practitioner").await, json!(true));

    // Unlisted pages fall back to deny, owner is always allowed
    let unlisted = app
        .call(Method::GET, "/page-permissions/check?page_path=/reports&role=admin", Some(&owner), None)
        .await;
    assert_eq!(unlisted.json()["data"]["allowed"], false);
    let as_owner = app
        .call(Method::GET, "/page-permissions/check?page_path=/reports", Some(&owner), None)
        .await;
    assert_eq!(as_owner.json()["data"]["allowed"], true);
}

#[tokio::test]
async fn suspended_practices_are_locked_out() {
    let app = common::test_app();
    let (owner, tenant_id) = app.register("Harbor Counseling", "owner@harbor.test").await;
    let operator = common::mint_token(Uuid::new_v4(), Uuid::new_v4(), common::ROOT_EMAIL, "owner", true);

    let suspended = app
        .call(
            Method::PUT,
            &format!("/root/tenants/{}/status", tenant_id),
            Some(&operator),
            Some(json!({"status": "suspended"})),
        )
        .await;
    assert_eq!(suspended.status, StatusCode::OK);
    assert_eq!(suspended.json()["data"]["status"], "suspended");

    let res = app.call(Method::GET, "/users", Some(&owner), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let login = app
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "owner@harbor.test", "password": common::PASSWORD})),
        )
        .await;
    assert_eq!(login.status, StatusCode::FORBIDDEN);
}
