// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OpenWeather current-conditions client.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{Lookup, Observation, WeatherProvider, WeatherQuery};

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    base_url: String,
    api_key: String,
    region: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(base_url: String, api_key: Option<String>, region: String) -> Result<Self> {
        crate::ensure_crypto();
        let http = Client::builder().build().context("Failed to build weather HTTP client")?;
        Ok(Self { base_url, api_key: api_key.unwrap_or_default(), region, http })
    }
}

/// `cod` arrives as a number on success and as a string on most errors.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwCode {
    Number(i64),
    Text(String),
}

impl OwCode {
    fn is_success(&self) -> bool {
        match self {
            Self::Number(n) => *n == 200,
            Self::Text(s) => s.trim() == "200",
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwResponse {
    cod: Option<OwCode>,
    message: Option<serde_json::Value>,
    name: Option<String>,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, query: &WeatherQuery) -> Result<Lookup> {
        let q = format!("{},{}", query.location, self.region);
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", q.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", query.units.as_str()),
            ])
            .send()
            .await
            .context("Failed to send request to weather provider")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read weather provider response body")?;
        tracing::debug!(%status, location = %query.location, "weather provider responded");

        let parsed: OwResponse =
            serde_json::from_str(&body).context("Failed to parse weather provider JSON")?;

        let success = parsed.cod.as_ref().map(OwCode::is_success).unwrap_or(false);
        if !success {
            let message = match parsed.message {
                Some(serde_json::Value::String(s)) => s,
                Some(other) if !other.is_null() => other.to_string(),
                _ => status.canonical_reason().unwrap_or("Error fetching weather").to_owned(),
            };
            return Ok(Lookup::Rejected(message));
        }

        let city = parsed.name.ok_or_else(|| anyhow!("weather response missing `name`"))?;
        let main = parsed.main.ok_or_else(|| anyhow!("weather response missing `main`"))?;
        let description = parsed
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .ok_or_else(|| anyhow!("weather response contained no conditions"))?;

        Ok(Lookup::Found(Observation { city, temperature: main.temp, description }))
    }
}

#[cfg(test)]
#[path = "openweather_tests.rs"]
mod tests;
