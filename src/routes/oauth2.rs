// ABOUTME: Thin handlers for the OAuth2 protocol endpoints and session logout
// ABOUTME: Translates flow outcomes into redirects, JSON bodies and cookie headers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::AppState;
use crate::constants::AUTH_TOKEN_COOKIE;
use crate::errors::AppError;
use crate::oauth2::flow::FlowOutcome;
use crate::oauth2::models::{
    AuthorizeParams, CallbackParams, IntrospectRequest, IntrospectionResponse, TokenRequest,
    TokenResponse,
};
use crate::security::cookies::{clear_cookie, get_cookie_value};
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};

/// GET /authorize/google - entry point of the authorization-code flow
pub async fn authorize(
    State(state): State<AppState>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    outcome_response(state.flow.authorize(&params))
}

/// GET /callback/google - identity provider return leg
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Response {
    outcome_response(state.flow.callback(&params, &headers).await)
}

/// POST /token - exchange a sealed authorization code for a bearer token
pub async fn token(
    State(state): State<AppState>,
    Form(request): Form<TokenRequest>,
) -> Result<Json<TokenResponse>, Response> {
    state
        .flow
        .token(&request)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// POST /introspect - RFC 7662 token introspection
pub async fn introspect(
    State(state): State<AppState>,
    Form(request): Form<IntrospectRequest>,
) -> Result<Json<IntrospectionResponse>, Response> {
    state
        .introspector
        .introspect(&request)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// POST /revoke - RFC 7009 token revocation; bare 200 on every idempotent
/// success
pub async fn revoke(
    State(state): State<AppState>,
    Form(request): Form<IntrospectRequest>,
) -> Result<StatusCode, Response> {
    state
        .introspector
        .revoke(&request)
        .await
        .map(|()| StatusCode::OK)
        .map_err(IntoResponse::into_response)
}

/// POST /logout - revoke the session cookie's token and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = get_cookie_value(&headers, AUTH_TOKEN_COOKIE) {
        match state.token_store.delete(&token).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }

    Response::builder()
        .status(StatusCode::RESET_CONTENT)
        .header(header::SET_COOKIE, clear_cookie(AUTH_TOKEN_COOKIE, "/"))
        .body(Body::empty())
        .map_err(|e| AppError::internal(format!("response build failed: {e}")))
}

fn outcome_response(outcome: FlowOutcome) -> Response {
    match outcome {
        FlowOutcome::Redirect { location, cookies } => {
            let mut builder = Response::builder()
                .status(StatusCode::FOUND)
                .header(header::LOCATION, location);
            for cookie in cookies {
                builder = builder.header(header::SET_COOKIE, cookie);
            }
            builder.body(Body::empty()).map_or_else(
                |e| AppError::internal(format!("redirect build failed: {e}")).into_response(),
                |response| response,
            )
        }
        FlowOutcome::Reject { error, cookies } => {
            let mut response = error.into_response();
            for cookie in cookies {
                if let Ok(value) = header::HeaderValue::from_str(&cookie) {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
            }
            response
        }
    }
}
