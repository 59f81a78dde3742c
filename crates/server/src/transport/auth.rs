// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::credential::{Claims, TokenAuthority};
use crate::error::AuthFailure;
use crate::state::AppState;

/// Header carrying the browser's correlation id on synchronous requests.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Caller identity attached to authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub exp: u64,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self { username: claims.username, exp: claims.exp }
    }
}

/// Correlation id declared by the caller, if any.
pub fn client_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(CLIENT_ID_HEADER).and_then(|v| v.to_str().ok()).filter(|id| !id.is_empty())
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthFailure> {
    let header =
        headers.get("authorization").and_then(|v| v.to_str().ok()).ok_or(AuthFailure::NoToken)?;
    header.strip_prefix("Bearer ").ok_or(AuthFailure::NoToken)
}

/// Validate the bearer token from HTTP headers.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenAuthority) -> Result<Claims, AuthFailure> {
    let token = bearer_token(headers)?;
    tokens.verify(token).map_err(|e| {
        tracing::debug!(reason = %e, "bearer token rejected");
        AuthFailure::InvalidToken
    })
}

/// Build the 401 reply for `failure` and mirror it onto the caller's
/// real-time channel when one is registered and open.
pub fn reject(state: &AppState, headers: &HeaderMap, failure: AuthFailure) -> Response {
    if let Some(id) = client_id(headers) {
        state.registry.push_error(id, failure.message());
    }
    failure.code().to_http_response(failure.message()).into_response()
}

/// Whether the request asks to switch to the WebSocket protocol.
pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

fn is_exempt(req: &Request<axum::body::Body>) -> bool {
    match req.uri().path() {
        "/login" => true,
        // WebSocket frames carry their own token; plain requests are gated.
        "/" | "/ws" => is_websocket_upgrade(req.headers()),
        _ => false,
    }
}

/// Axum middleware that enforces Bearer token authentication on all routes
/// except `/login` and WebSocket upgrades on `/` and `/ws`.
pub async fn auth_layer(
    State(state): State<Arc<AppState>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if is_exempt(&req) {
        return next.run(req).await;
    }

    match authenticate(req.headers(), &state.tokens) {
        Ok(claims) => {
            req.extensions_mut().insert(Identity::from(claims));
            next.run(req).await
        }
        Err(failure) => {
            tracing::info!(path = %req.uri().path(), %failure, "request rejected");
            reject(&state, req.headers(), failure)
        }
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
