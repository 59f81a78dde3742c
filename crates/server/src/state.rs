// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use crate::accounts::AccountDirectory;
use crate::config::ServerConfig;
use crate::credential::TokenAuthority;
use crate::dispatch::WeatherDispatcher;
use crate::registry::ConnectionRegistry;
use crate::weather::WeatherProvider;

/// Shared application state passed to all handlers via axum `State` extractor.
pub struct AppState {
    pub config: ServerConfig,
    /// Sole owner of the signing secret.
    pub tokens: Arc<TokenAuthority>,
    pub accounts: AccountDirectory,
    pub registry: ConnectionRegistry,
    pub dispatcher: WeatherDispatcher,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        accounts: AccountDirectory,
        provider: Arc<dyn WeatherProvider>,
    ) -> Self {
        let tokens = Arc::new(TokenAuthority::new(&config.jwt_secret, config.token_ttl()));
        let dispatcher = WeatherDispatcher::new(Arc::clone(&tokens), provider);
        Self { config, tokens, accounts, registry: ConnectionRegistry::new(), dispatcher }
    }
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
