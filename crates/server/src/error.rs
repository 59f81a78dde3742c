// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for the synchronous HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Unauthorized,
    BadRequest,
    UpstreamError,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::BadRequest => 400,
            Self::UpstreamError => 502,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        (self.status_code(), Json(ErrorResponse { error: message.into() }))
    }
}

/// Synchronous error body: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Authentication failures visible to HTTP callers and mirrored onto the
/// caller's real-time channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// `Authorization` header absent or not a `Bearer` scheme.
    NoToken,
    /// Token present but malformed, forged, or expired.
    InvalidToken,
    /// Login with an unknown username/password pair.
    InvalidCredentials,
}

impl AuthFailure {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoToken => "No token provided",
            Self::InvalidToken => "Invalid token",
            Self::InvalidCredentials => "Invalid credentials",
        }
    }

    pub fn code(&self) -> ErrorCode {
        ErrorCode::Unauthorized
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Reasons a real-time request produced a failure reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    InvalidFormat,
    InvalidType,
    InvalidToken,
    LocationRequired,
    InvalidUnits,
    /// The provider answered but refused; carries its message verbatim.
    Upstream(String),
    /// The provider could not be reached or returned an unusable body.
    FetchFailed,
}

impl DispatchError {
    /// HTTP code used when the same failure surfaces on the synchronous API.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidToken => ErrorCode::Unauthorized,
            Self::Upstream(_) | Self::FetchFailed => ErrorCode::UpstreamError,
            Self::InvalidFormat
            | Self::InvalidType
            | Self::LocationRequired
            | Self::InvalidUnits => ErrorCode::BadRequest,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat => f.write_str("Invalid message format"),
            Self::InvalidType => f.write_str("Invalid message type"),
            Self::InvalidToken => f.write_str("Invalid token"),
            Self::LocationRequired => f.write_str("Location is required"),
            Self::InvalidUnits => f.write_str("Invalid units. Use metric or imperial"),
            Self::Upstream(message) => f.write_str(message),
            Self::FetchFailed => f.write_str("Error fetching weather"),
        }
    }
}

impl std::error::Error for DispatchError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
