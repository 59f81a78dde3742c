// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous HTTP handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::dispatch::Reply;
use crate::error::AuthFailure;
use crate::state::AppState;
use crate::transport::auth::{self, Identity};

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub units: String,
}

// -- Handlers -----------------------------------------------------------------

/// `POST /login`: exchange a username/password pair for a session token.
///
/// A missing or unreadable body counts as empty credentials.
pub async fn login(State(s): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    let req: LoginRequest = serde_json::from_slice(&body).unwrap_or_default();

    match s.accounts.authenticate(&req.username, &req.password) {
        Some(username) => {
            let token = s.tokens.issue(username);
            tracing::info!(user = username, client_id = ?auth::client_id(&headers), "login succeeded");
            Json(LoginResponse { token }).into_response()
        }
        None => {
            tracing::warn!(user = %req.username, client_id = ?auth::client_id(&headers), "login failed");
            auth::reject(&s, &headers, AuthFailure::InvalidCredentials)
        }
    }
}

/// `GET /me`: identity attached by the auth layer.
pub async fn me(Extension(identity): Extension<Identity>) -> impl IntoResponse {
    Json(identity)
}

/// `GET /weather?location=&units=`: synchronous weather lookup.
pub async fn weather(
    State(s): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<WeatherParams>,
) -> Response {
    tracing::info!(
        user = %identity.username,
        location = %params.location,
        units = %params.units,
        "http weather request"
    );
    match s.dispatcher.lookup(&params.location, &params.units).await {
        Ok(report) => Json(Reply::ok(report)).into_response(),
        Err(e) => (e.code().status_code(), Json(Reply::failure(e.to_string()))).into_response(),
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
