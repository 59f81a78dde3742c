// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `weatherwire` binary and
//! exercise login, the HTTP lookup, and the WebSocket channel.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use weatherwire_specs::{wait_exit, FakeUpstream, WeatherwireProcess, API_KEY, JWT_SECRET};

const TIMEOUT: Duration = Duration::from_secs(10);

async fn recv_json<S>(rx: &mut S) -> anyhow::Result<serde_json::Value>
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let msg = tokio::time::timeout(TIMEOUT, rx.next())
        .await
        .map_err(|_| anyhow::anyhow!("ws recv timeout"))?
        .ok_or_else(|| anyhow::anyhow!("ws stream closed"))??;
    match msg {
        Message::Text(text) => Ok(serde_json::from_str(&text)?),
        other => anyhow::bail!("expected Text message, got {other:?}"),
    }
}

// -- WebSocket ----------------------------------------------------------------

#[tokio::test]
async fn ws_weather_lookup_end_to_end() -> anyhow::Result<()> {
    let upstream = FakeUpstream::start().await?;
    let server = WeatherwireProcess::start(upstream.url())?;
    server.wait_ready(TIMEOUT).await?;

    let token = server.login().await?;
    let (stream, _) = tokio_tungstenite::connect_async(server.ws_url("1712345678901")).await?;
    let (mut tx, mut rx) = stream.split();

    let request = serde_json::json!({
        "type": "weather",
        "location": "Sydney",
        "units": "metric",
        "token": token,
    });
    tx.send(Message::Text(request.to_string().into())).await?;

    let resp = recv_json(&mut rx).await?;
    assert_eq!(
        resp,
        serde_json::json!({
            "success": true,
            "data": {
                "city": "Sydney",
                "temperature": 18.4,
                "description": "overcast clouds",
                "units": "°C",
            }
        })
    );

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].get("q").map(String::as_str), Some("Sydney,AU"));
    assert_eq!(requests[0].get("appid").map(String::as_str), Some(API_KEY));
    assert_eq!(requests[0].get("units").map(String::as_str), Some("metric"));
    Ok(())
}

#[tokio::test]
async fn ws_receives_failed_login_push() -> anyhow::Result<()> {
    let upstream = FakeUpstream::start().await?;
    let server = WeatherwireProcess::start(upstream.url())?;
    server.wait_ready(TIMEOUT).await?;

    let (stream, _) = tokio_tungstenite::connect_async(server.ws_url("tab-smoke")).await?;
    let (mut tx, mut rx) = stream.split();

    // Round-trip one frame so the server has registered the connection.
    tx.send(Message::Text(r#"{"type":"weather"}"#.into())).await?;
    assert_eq!(recv_json(&mut rx).await?["error"], "Invalid token");

    let status = reqwest::Client::new()
        .post(format!("{}/login", server.base_url()))
        .header("x-client-id", "tab-smoke")
        .json(&serde_json::json!({ "username": "user", "password": "wrong" }))
        .send()
        .await?
        .status();
    assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);

    let pushed = recv_json(&mut rx).await?;
    assert_eq!(pushed, serde_json::json!({ "success": false, "error": "Invalid credentials" }));
    Ok(())
}

// -- HTTP ---------------------------------------------------------------------

#[tokio::test]
async fn http_lookup_passes_upstream_rejection_through() -> anyhow::Result<()> {
    let upstream = FakeUpstream::start().await?;
    let server = WeatherwireProcess::start(upstream.url())?;
    server.wait_ready(TIMEOUT).await?;

    let token = server.login().await?;
    let resp = reqwest::Client::new()
        .get(format!("{}/weather", server.base_url()))
        .query(&[("location", "Atlantis"), ("units", "metric")])
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body, serde_json::json!({ "success": false, "error": "city not found" }));
    Ok(())
}

#[tokio::test]
async fn http_me_requires_token() -> anyhow::Result<()> {
    let upstream = FakeUpstream::start().await?;
    let server = WeatherwireProcess::start(upstream.url())?;
    server.wait_ready(TIMEOUT).await?;

    let resp = reqwest::get(format!("{}/me", server.base_url())).await?;
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"], "No token provided");
    Ok(())
}

// -- Startup ------------------------------------------------------------------

#[tokio::test]
async fn invalid_config_exits_with_usage_error() -> anyhow::Result<()> {
    let mut child =
        WeatherwireProcess::command(&["--jwt-secret", JWT_SECRET, "--token-ttl-secs", "0"])?
            .spawn()?;
    let status = wait_exit(&mut child, TIMEOUT).await?;
    assert_eq!(status.code(), Some(2));
    Ok(())
}

#[tokio::test]
async fn missing_secret_refuses_to_start() -> anyhow::Result<()> {
    let mut child = WeatherwireProcess::command(&[])?.spawn()?;
    let status = wait_exit(&mut child, TIMEOUT).await?;
    assert!(!status.success());
    Ok(())
}
