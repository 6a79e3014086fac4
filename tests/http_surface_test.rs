// ABOUTME: End-to-end HTTP tests over the axum router with tower oneshot
// ABOUTME: Status codes, redirect headers, cookie handling and JSON bodies
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use campus_auth::routes::router;
use common::{harness, record_for, REDIRECT_URI};
use http_body_util::BodyExt as _;
use tower::ServiceExt as _;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(Body::from(body.to_owned()))
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let h = harness();
    let app = router(h.app_state());

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn authorize_sets_flow_cookies_and_redirects_to_the_provider() {
    let h = harness();
    let app = router(h.app_state());

    let query = serde_urlencoded::to_string([
        ("response_type", "code"),
        ("redirect_uri", REDIRECT_URI),
        ("state", "s1"),
        ("code_challenge", "abc"),
        ("code_challenge_method", "S256"),
    ])
    .unwrap();
    let uri = format!("/authorize/google?{query}");
    let response = app
        .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://idp.example/auth"));

    let set_cookies: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
    assert_eq!(set_cookies.len(), 3);
    for cookie in set_cookies {
        let value = cookie.to_str().unwrap();
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
    }
}

#[tokio::test]
async fn authorize_with_untrusted_redirect_is_a_400() {
    let h = harness();
    let app = router(h.app_state());

    let uri = "/authorize/google?response_type=code&redirect_uri=https%3A%2F%2Fevil.example%2Fcb&code_challenge=abc&code_challenge_method=S256";
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");
}

#[tokio::test]
async fn token_with_a_bad_grant_type_is_a_400() {
    let h = harness();
    let app = router(h.app_state());

    let response = app
        .oneshot(form_request("/token", "grant_type=password&code=x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "unsupported_grant_type");
}

#[tokio::test]
async fn introspect_without_a_token_is_a_400() {
    let h = harness();
    let app = router(h.app_state());

    let response = app.oneshot(form_request("/introspect", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");
}

#[tokio::test]
async fn introspecting_an_unknown_token_is_200_inactive() {
    let h = harness();
    let app = router(h.app_state());

    let response = app
        .oneshot(form_request("/introspect", "token=never-issued"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, serde_json::json!({ "active": false }));
}

#[tokio::test]
async fn revoking_an_unknown_token_is_still_a_200() {
    let h = harness();
    let app = router(h.app_state());

    let response = app
        .oneshot(form_request("/revoke", "token=never-issued"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_revokes_the_cookie_session_and_clears_the_cookie() {
    let h = harness();
    let token = h.token_store.create(&record_for(1)).await.unwrap();
    let app = router(h.app_state());

    let request = Request::builder()
        .method("POST")
        .uri("/logout")
        .header(header::COOKIE, format!("auth_token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::RESET_CONTENT);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("auth_token="));
    assert!(set_cookie.contains("Max-Age=0"));
    assert!(h.token_store.peek(&token).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn logout_without_a_session_is_still_a_205() {
    let h = harness();
    let app = router(h.app_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::RESET_CONTENT);
}

#[tokio::test]
async fn malformed_authorization_header_rejects_any_route() {
    let h = harness();
    let app = router(h.app_state());

    let request = Request::get("/health")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "AUTH_MALFORMED");
}
