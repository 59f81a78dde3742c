// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Default upstream endpoint for current conditions.
pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Configuration for the weatherwire server.
#[derive(Debug, Clone, clap::Args)]
pub struct ServerConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "WEATHERWIRE_HOST")]
    pub host: String,

    /// Port to listen on (HTTP and WebSocket share it).
    #[arg(long, default_value_t = 5000, env = "PORT")]
    pub port: u16,

    /// Base URL of the upstream weather provider.
    #[arg(long, default_value = DEFAULT_WEATHER_API_URL, env = "WEATHER_API_URL")]
    pub weather_api_url: String,

    /// API key for the upstream weather provider.
    #[arg(long, env = "WEATHER_API_KEY")]
    pub weather_api_key: Option<String>,

    /// Country code appended to every location query.
    #[arg(long, default_value = "AU", env = "WEATHER_REGION")]
    pub region: String,

    /// Shared secret used to sign and verify session tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Lifetime of issued session tokens, in seconds.
    #[arg(long, default_value_t = 3600, env = "TOKEN_TTL_SECS")]
    pub token_ttl_secs: u64,

    /// Log format (json or text).
    #[arg(long, default_value = "text", env = "WEATHERWIRE_LOG_FORMAT")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "WEATHERWIRE_LOG_LEVEL")]
    pub log_level: String,
}

impl ServerConfig {
    /// Reject combinations the server cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.is_empty() {
            anyhow::bail!("--jwt-secret must not be empty");
        }
        if self.token_ttl_secs == 0 {
            anyhow::bail!("--token-ttl-secs must be greater than zero");
        }
        if self.region.trim().is_empty() {
            anyhow::bail!("--region must not be empty");
        }
        if !(self.weather_api_url.starts_with("http://")
            || self.weather_api_url.starts_with("https://"))
        {
            anyhow::bail!("--weather-api-url must be an http(s) URL: {}", self.weather_api_url);
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid --log-format: {other} (expected json or text)"),
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
