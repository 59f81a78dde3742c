// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for unit and integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::accounts::AccountDirectory;
use crate::config::{ServerConfig, DEFAULT_WEATHER_API_URL};
use crate::state::AppState;
use crate::weather::{Lookup, Observation, WeatherProvider, WeatherQuery};

pub const TEST_SECRET: &str = "test-secret";

/// Configuration suitable for in-process servers.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        weather_api_url: DEFAULT_WEATHER_API_URL.into(),
        weather_api_key: None,
        region: "AU".into(),
        jwt_secret: TEST_SECRET.into(),
        token_ttl_secs: 3600,
        log_format: "text".into(),
        log_level: "info".into(),
    }
}

/// What a [`StubProvider`] answers with.
#[derive(Debug, Clone)]
pub enum StubAnswer {
    Found { temperature: f64, description: String },
    Rejected(String),
    Fault(String),
}

/// Provider that answers every query with a fixed outcome and records the
/// queries it received.
#[derive(Debug)]
pub struct StubProvider {
    answer: StubAnswer,
    calls: Mutex<Vec<WeatherQuery>>,
}

impl StubProvider {
    pub fn new(answer: StubAnswer) -> Arc<Self> {
        Arc::new(Self { answer, calls: Mutex::new(Vec::new()) })
    }

    /// Answers with the queried location as the city.
    pub fn sunny() -> Arc<Self> {
        Self::new(StubAnswer::Found { temperature: 21.5, description: "clear sky".to_owned() })
    }

    pub fn calls(&self) -> Vec<WeatherQuery> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl WeatherProvider for StubProvider {
    async fn current(&self, query: &WeatherQuery) -> anyhow::Result<Lookup> {
        self.calls.lock().push(query.clone());
        match self.answer.clone() {
            StubAnswer::Found { temperature, description } => Ok(Lookup::Found(Observation {
                city: query.location.clone(),
                temperature,
                description,
            })),
            StubAnswer::Rejected(message) => Ok(Lookup::Rejected(message)),
            StubAnswer::Fault(message) => Err(anyhow::anyhow!(message)),
        }
    }
}

/// Build shared state around a stub provider.
pub fn test_state(provider: Arc<StubProvider>) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(), AccountDirectory::default(), provider))
}

/// Spawn the full router on a random port for integration testing.
///
/// Returns the bound address and a join handle for the server task.
pub async fn spawn_http_server(
    state: Arc<AppState>,
) -> anyhow::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let router = crate::transport::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok((addr, handle))
}

/// Assert that an expression returns `Err` whose message contains a substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
