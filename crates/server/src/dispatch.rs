// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real-time request pipeline.
//!
//! Each inbound frame runs parse → type check → authenticate → validate →
//! fetch and yields exactly one [`Reply`]. The first failing step decides the
//! reply; token problems outrank input problems.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::credential::{Claims, TokenAuthority};
use crate::error::DispatchError;
use crate::weather::{Lookup, Units, WeatherProvider, WeatherQuery};

/// Client → server frames, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Weather {
        #[serde(default, deserialize_with = "lenient_string")]
        location: Option<String>,
        #[serde(default, deserialize_with = "lenient_string")]
        units: Option<String>,
        #[serde(default, deserialize_with = "lenient_string")]
        token: Option<String>,
    },
}

/// Accept any JSON value, keeping only strings. A wrongly-typed field then
/// fails its own validation step instead of the whole frame.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// Normalized weather result sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    pub temperature: f64,
    pub description: String,
    /// Displayed unit symbol, derived from the requested units.
    pub units: String,
}

/// Server → client frame: `{success:true, data}` or `{success:false, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<WeatherReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    pub fn ok(report: WeatherReport) -> Self {
        Self { success: true, data: Some(report), error: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(message.into()) }
    }
}

impl From<Result<WeatherReport, DispatchError>> for Reply {
    fn from(result: Result<WeatherReport, DispatchError>) -> Self {
        match result {
            Ok(report) => Self::ok(report),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// Decode one frame. Non-JSON or non-object text is a format error; an
/// object without a known `type` is a type error.
pub fn parse_message(text: &str) -> Result<ClientMessage, DispatchError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|_| DispatchError::InvalidFormat)?;
    if !value.is_object() {
        return Err(DispatchError::InvalidFormat);
    }
    serde_json::from_value(value).map_err(|_| DispatchError::InvalidType)
}

/// Stateless handler shared by every real-time connection.
#[derive(Debug, Clone)]
pub struct WeatherDispatcher {
    tokens: Arc<TokenAuthority>,
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherDispatcher {
    pub fn new(tokens: Arc<TokenAuthority>, provider: Arc<dyn WeatherProvider>) -> Self {
        Self { tokens, provider }
    }

    /// Handle one inbound frame and build its reply.
    pub async fn handle(&self, text: &str) -> Reply {
        let result = self.process(text).await;
        if let Err(ref e) = result {
            tracing::debug!(err = %e, "weather request failed");
        }
        Reply::from(result)
    }

    pub async fn process(&self, text: &str) -> Result<WeatherReport, DispatchError> {
        match parse_message(text)? {
            ClientMessage::Weather { location, units, token } => {
                let claims = self.authenticate(token.as_deref())?;
                let location = location.unwrap_or_default();
                let units = units.unwrap_or_default();
                tracing::info!(user = %claims.username, %location, %units, "weather request");
                self.lookup(&location, &units).await
            }
        }
    }

    fn authenticate(&self, token: Option<&str>) -> Result<Claims, DispatchError> {
        let token = token.ok_or(DispatchError::InvalidToken)?;
        self.tokens.verify(token).map_err(|e| {
            tracing::debug!(reason = %e, "token rejected");
            DispatchError::InvalidToken
        })
    }

    /// Validate inputs and fetch from the provider. Callers must have
    /// authenticated the request already.
    pub async fn lookup(
        &self,
        location: &str,
        units: &str,
    ) -> Result<WeatherReport, DispatchError> {
        if location.is_empty() {
            return Err(DispatchError::LocationRequired);
        }
        let units = Units::parse(units).ok_or(DispatchError::InvalidUnits)?;

        let query = WeatherQuery { location: location.to_owned(), units };
        match self.provider.current(&query).await {
            Ok(Lookup::Found(obs)) => Ok(WeatherReport {
                city: obs.city,
                temperature: obs.temperature,
                description: obs.description,
                units: units.symbol().to_owned(),
            }),
            Ok(Lookup::Rejected(message)) => {
                tracing::info!(location, %message, "weather provider rejected request");
                Err(DispatchError::Upstream(message))
            }
            Err(e) => {
                tracing::warn!(location, err = %format!("{e:#}"), "weather fetch failed");
                Err(DispatchError::FetchFailed)
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
