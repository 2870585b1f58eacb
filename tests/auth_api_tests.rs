
use actix_web::{
    http::{header, StatusCode},
    test,
};
use serde_json::{json, Value};

use test_utils::{MultipartBody, TestApp};

const PASSWORD: &str = "Tr0ub4dor&3-Horse-Battery!";

fn credentials(username: &str, password: &str) -> Value {
    json!({ "username": username, "password": password })
}

#[actix_rt::test]
async fn owner_registers_once_then_logs_in_and_refreshes() {
    let harness = TestApp::new();
    let app = init_app!(harness.state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(credentials("owner", PASSWORD))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(credentials("intruder", PASSWORD))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(credentials("owner", PASSWORD))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let tokens: Value = test::read_body_json(resp).await;
    assert_eq!(tokens["tokenType"], "Bearer");
    let access = tokens["accessToken"].as_str().unwrap().to_string();
    let refresh = tokens["refreshToken"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refreshToken": refresh }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // A freshly issued access token authorises writes.
    let (content_type, payload) = MultipartBody::new()
        .text("title", "From login")
        .text("content", "body")
        .build();
    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::CONTENT_TYPE, content_type))
        .insert_header((header::AUTHORIZATION, format!("Bearer {access}")))
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_rt::test]
async fn concurrent_registrations_create_a_single_owner() {
    let harness = TestApp::new();
    let app = init_app!(harness.state);

    let first = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(credentials("owner", PASSWORD))
        .to_request();
    let second = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(credentials("other-owner", PASSWORD))
        .to_request();

    let (a, b) = futures_util::future::join(
        test::call_service(&app, first),
        test::call_service(&app, second),
    )
    .await;

    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::FORBIDDEN]);
    assert_eq!(harness.users.len(), 1);
}

#[actix_rt::test]
async fn wrong_password_is_rejected() {
    let harness = TestApp::new();
    let app = init_app!(harness.state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(credentials("owner", PASSWORD))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(credentials("owner", "Wr0ng-Password!"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn weak_password_fails_validation() {
    let harness = TestApp::new();
    let app = init_app!(harness.state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(credentials("owner", "password"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn access_token_cannot_be_used_to_refresh() {
    let harness = TestApp::new();
    let app = init_app!(harness.state);

    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refreshToken": harness.admin_token() }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn malformed_json_body_is_a_bad_request() {
    let harness = TestApp::new();
    let app = init_app!(harness.state);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
