// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream weather lookup capability.

pub mod openweather;

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use openweather::OpenWeatherProvider;

/// Measurement system requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Imperial,
}

impl Units {
    /// Parse the exact wire spelling; anything else is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "metric" => Some(Self::Metric),
            "imperial" => Some(Self::Imperial),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    /// Displayed temperature unit.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    pub location: String,
    pub units: Units,
}

/// Current conditions as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub city: String,
    pub temperature: f64,
    pub description: String,
}

/// Outcome of a provider call that produced a readable answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Observation),
    /// The provider answered with a non-success code and this message.
    Rejected(String),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current conditions. `Err` means the provider was unreachable or
    /// its body could not be read.
    async fn current(&self, query: &WeatherQuery) -> anyhow::Result<Lookup>;
}
