//! # Server Configuration
//!
//! Settings are layered, later layers winning:
//! 1. Built-in defaults
//! 2. An optional TOML file (`--config`)
//! 3. Environment variables (`GAMEDEX_*`)
//! 4. CLI flags (applied by the `server` command)
//!
//! ## Environment Variables
//!
//! - `GAMEDEX_PUBLIC_URL`: Base of next-page links (default: `http://localhost:8080`)
//! - `GAMEDEX_API_KEY`: If set, `/v1` and `/v2` require this key
//! - `GAMEDEX_RATE_LIMIT_V1`: Requests per second on `/v1` (default: 5, 0 to disable)
//! - `GAMEDEX_RATE_LIMIT_V2`: Requests per second on `/v2` (default: 20, 0 to disable)
//! - `GAMEDEX_CORS_ORIGINS`: Comma-separated origins, or "*" (default: localhost only)

use gamedex_core::CatalogError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest config file accepted.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Runtime settings of the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Scheme, host and port clients reach the server on. Only next-page
    /// links are built on it.
    pub public_base_url: String,
    pub api_key: Option<String>,
    pub rate_limit_v1: u32,
    pub rate_limit_v2: u32,
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            public_base_url: "http://localhost:8080".to_string(),
            api_key: None,
            rate_limit_v1: 5,
            rate_limit_v2: 20,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        toml::from_str(text).map_err(|e| CatalogError::Io(format!("Invalid config file: {}", e)))
    }

    /// Defaults, then the file at `path` (if given), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        let mut config = match path {
            Some(path) => {
                let metadata = std::fs::metadata(path).map_err(|e| {
                    CatalogError::Io(format!("Cannot read config '{}': {}", path.display(), e))
                })?;
                if metadata.len() > MAX_CONFIG_FILE_SIZE {
                    return Err(CatalogError::Io(format!(
                        "Config file {} bytes exceeds maximum {} bytes",
                        metadata.len(),
                        MAX_CONFIG_FILE_SIZE
                    )));
                }
                let text = std::fs::read_to_string(path).map_err(|e| {
                    CatalogError::Io(format!("Cannot read config '{}': {}", path.display(), e))
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env_from(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply `GAMEDEX_*` overrides read through `lookup`.
    ///
    /// Empty values are ignored, as are rate limits that do not parse.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("GAMEDEX_PUBLIC_URL") {
            self.public_base_url = url;
        }
        if let Some(key) = var("GAMEDEX_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(limit) = var("GAMEDEX_RATE_LIMIT_V1").and_then(|v| v.trim().parse().ok()) {
            self.rate_limit_v1 = limit;
        }
        if let Some(limit) = var("GAMEDEX_RATE_LIMIT_V2").and_then(|v| v.trim().parse().ok()) {
            self.rate_limit_v2 = limit;
        }
        if let Some(origins) = var("GAMEDEX_CORS_ORIGINS") {
            self.cors_origins = Some(origins);
        }
    }

    /// The configured API key, unless it is empty.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// `public_base_url` without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }

    /// `host:port` for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================
