mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn register_login_whoami() {
    let app = common::test_app();
    let (_, tenant_id) = app.register("Harbor Counseling", "Owner@Harbor.test").await;

    let login = app
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "owner@harbor.test", "password": common::PASSWORD})),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let token = login.json()["data"]["token"].as_str().unwrap().to_string();

    let me = app.call(Method::GET, "/auth/whoami", Some(&token), None).await;
    assert_eq!(me.status, StatusCode::OK);
    let body = me.json();
    assert_eq!(body["data"]["email"], "owner@harbor.test");
    assert_eq!(body["data"]["role"], "owner");
    assert_eq!(body["data"]["root"], false);
    assert_eq!(body["data"]["tenant"]["tenant_id"], tenant_id.to_string());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = common::test_app();
    app.register("Harbor Counseling", "owner@harbor.test").await;

    let again = app
        .call(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "practice_name": "Second Practice",
                "email": "owner@harbor.test",
                "first_name": "Sam",
                "last_name": "Reyes",
                "password": common::PASSWORD,
            })),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.json()["code"], "CONFLICT");
}

#[tokio::test]
async fn short_passwords_are_rejected() {
    let app = common::test_app();
    let res = app
        .call(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "practice_name": "Harbor Counseling",
                "email": "owner@harbor.test",
                "first_name": "Avery",
                "last_name": "Stone",
                "password": "short",
            })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn root_emails_receive_root_tokens() {
    let app = common::test_app();
    let (token, _) = app.register("Platform Ops", common::ROOT_EMAIL).await;

    let tenants = app.call(Method::GET, "/root/tenants", Some(&token), None).await;
    assert_eq!(tenants.status, StatusCode::OK);
    assert_eq!(tenants.json()["data"].as_array().unwrap().len(), 1);
}
