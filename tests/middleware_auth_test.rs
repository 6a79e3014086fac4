// ABOUTME: Authentication resolver tests: header and cookie extraction, soft failures
// ABOUTME: Includes the corrupt-record auto-revocation path via a raw backend write
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use campus_auth::constants::TOKEN_KEY_PREFIX;
use campus_auth::errors::ErrorCode;
use campus_auth::store::KeyValueStore as _;
use axum::http::{HeaderMap, HeaderValue};
use common::{harness, record_for};
use std::time::Duration;

fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

#[tokio::test]
async fn no_credentials_resolves_to_anonymous() {
    let h = harness();
    let principal = h.resolver.resolve(&HeaderMap::new()).await.unwrap();
    assert!(principal.is_none());
}

#[tokio::test]
async fn valid_bearer_header_yields_the_principal() {
    let h = harness();
    let record = record_for(5);
    let token = h.token_store.create(&record).await.unwrap();

    let principal = h
        .resolver
        .resolve(&bearer_headers(&token))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(principal.token, token);
    assert_eq!(principal.record, record);
    assert_eq!(principal.user_id(), 5);
}

#[tokio::test]
async fn session_cookie_wins_over_the_authorization_header() {
    let h = harness();
    let cookie_token = h.token_store.create(&record_for(1)).await.unwrap();
    let header_token = h.token_store.create(&record_for(2)).await.unwrap();

    let mut headers = bearer_headers(&header_token);
    headers.insert(
        "cookie",
        HeaderValue::from_str(&format!("auth_token={cookie_token}")).unwrap(),
    );

    let principal = h.resolver.resolve(&headers).await.unwrap().unwrap();
    assert_eq!(principal.user_id(), 1);
}

#[tokio::test]
async fn unknown_token_degrades_to_anonymous() {
    let h = harness();
    let principal = h
        .resolver
        .resolve(&bearer_headers("not-a-real-token"))
        .await
        .unwrap();
    assert!(principal.is_none());
}

#[tokio::test]
async fn non_bearer_scheme_is_a_hard_format_error() {
    let h = harness();
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_static("Basic dXNlcjpwYXNz"),
    );
    let err = h.resolver.resolve(&headers).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthMalformed);
}

#[tokio::test]
async fn empty_bearer_token_is_malformed() {
    let h = harness();
    let mut headers = HeaderMap::new();
    headers.insert("authorization", HeaderValue::from_static("Bearer "));
    let err = h.resolver.resolve(&headers).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthMalformed);
}

#[tokio::test]
async fn corrupt_record_is_revoked_and_rejected() {
    let h = harness();

    // A record that parses but fails validation: empty scope set
    let raw = serde_json::json!({
        "user_id": 9,
        "user_email": "user9@campus.example",
        "machine": "web",
        "scopes": []
    });
    let token = "corrupt-record-token";
    h.backend
        .set_ex(
            &format!("{TOKEN_KEY_PREFIX}{token}"),
            &serde_json::to_vec(&raw).unwrap(),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let err = h.resolver.resolve(&bearer_headers(token)).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthInvalid);

    // The poisoned token was revoked on the spot
    assert!(h.token_store.peek(token).await.unwrap_err().is_not_found());
}
