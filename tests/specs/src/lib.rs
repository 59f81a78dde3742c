// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `weatherwire` binary as a subprocess, pointed at an
//! in-process fake weather upstream, and exercises it over HTTP and
//! WebSocket.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Once};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;

static CRYPTO_INIT: Once = Once::new();

pub const JWT_SECRET: &str = "smoke-secret";
pub const API_KEY: &str = "smoke-key";

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times; only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Resolve the path to the compiled `weatherwire` binary.
pub fn weatherwire_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("weatherwire")
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

// -- Fake upstream ------------------------------------------------------------

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

#[derive(Clone)]
struct Upstream {
    seen: Seen,
}

/// Answers like OpenWeather: "Atlantis" is unknown, everything else is
/// 18.4 degrees and overcast.
async fn current_weather(
    State(up): State<Upstream>,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, axum::Json<serde_json::Value>) {
    let city = q.get("q").and_then(|q| q.split(',').next()).unwrap_or_default().to_owned();
    up.seen.lock().push(q);
    if city == "Atlantis" {
        return (
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({ "cod": "404", "message": "city not found" })),
        );
    }
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({
            "cod": 200,
            "name": city,
            "main": { "temp": 18.4 },
            "weather": [{ "main": "Clouds", "description": "overcast clouds" }],
        })),
    )
}

/// An in-process stand-in for the weather provider.
pub struct FakeUpstream {
    url: String,
    seen: Seen,
    _task: tokio::task::JoinHandle<()>,
}

impl FakeUpstream {
    pub async fn start() -> anyhow::Result<Self> {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/data/2.5/weather", get(current_weather))
            .with_state(Upstream { seen: Arc::clone(&seen) });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Ok(Self { url: format!("http://{addr}/data/2.5/weather"), seen, _task: task })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query strings received so far.
    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.seen.lock().clone()
    }
}

// -- Process ------------------------------------------------------------------

/// A running `weatherwire` process that is killed on drop.
pub struct WeatherwireProcess {
    child: Child,
    port: u16,
}

impl WeatherwireProcess {
    /// Spawn the server against `upstream_url` with the smoke-test secret.
    pub fn start(upstream_url: &str) -> anyhow::Result<Self> {
        let port = free_port()?;
        let child = Self::command(&[
            "--port",
            &port.to_string(),
            "--weather-api-url",
            upstream_url,
            "--weather-api-key",
            API_KEY,
            "--jwt-secret",
            JWT_SECRET,
        ])?
        .spawn()?;
        Ok(Self { child, port })
    }

    /// A bare command for the binary with a scrubbed environment.
    pub fn command(args: &[&str]) -> anyhow::Result<Command> {
        ensure_crypto();
        let binary = weatherwire_binary();
        anyhow::ensure!(binary.exists(), "weatherwire binary not found at {}", binary.display());

        let mut cmd = Command::new(&binary);
        cmd.args(["--host", "127.0.0.1", "--log-format", "text", "--log-level", "warn"])
            .args(args)
            .env_remove("JWT_SECRET")
            .env_remove("PORT")
            .env_remove("WEATHER_API_KEY")
            .env_remove("WEATHER_API_URL")
            .env_remove("WEATHER_REGION")
            .env_remove("TOKEN_TTL_SECS")
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Ok(cmd)
    }

    /// Base URL for HTTP requests.
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// WebSocket URL declaring `client_id`.
    pub fn ws_url(&self, client_id: &str) -> String {
        format!("ws://127.0.0.1:{}/?clientId={client_id}", self.port)
    }

    /// Poll until the listener accepts connections.
    pub async fn wait_ready(&self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("weatherwire did not start listening within {timeout:?}");
            }
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port)).await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Log in as the built-in account and return the token.
    pub async fn login(&self) -> anyhow::Result<String> {
        let resp: serde_json::Value = reqwest::Client::new()
            .post(format!("{}/login", self.base_url()))
            .json(&serde_json::json!({ "username": "user", "password": "password" }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        resp["token"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| anyhow::anyhow!("login response without token: {resp}"))
    }
}

impl Drop for WeatherwireProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Wait for a spawned command to exit within `timeout`.
pub async fn wait_exit(
    child: &mut Child,
    timeout: Duration,
) -> anyhow::Result<std::process::ExitStatus> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if tokio::time::Instant::now() > deadline {
            let _ = child.kill();
            anyhow::bail!("weatherwire did not exit within {timeout:?}");
        }
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
