//! Configuration structures.
//!
//! Configuration is loaded once from environment variables at startup and
//! held immutably for the process lifetime.

use serde::{Deserialize, Serialize};

use crate::types::{Error, Result};

/// Default vendor API base URL.
pub const DEFAULT_BASE_URL: &str = "https://queue.fal.run";

/// Default HTTP front-end listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Vendor API key (`FAL_KEY`). Required; absence is fatal at startup.
    pub api_key: String,

    /// Vendor API base URL (`FAL_BASE_URL`, defaults to queue.fal.run).
    pub base_url: String,

    /// HTTP front-end listen port (`PORT`, defaults to 8000).
    pub port: u16,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Returns a configuration error if `FAL_KEY` is unset or empty.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("FAL_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::config("FAL_KEY environment variable is required"))?;

        let base_url = std::env::var("FAL_BASE_URL")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            api_key,
            base_url,
            port,
        })
    }

    /// Whether deployment-environment markers select HTTP mode over stdio.
    ///
    /// True when `PORT` or `RAILWAY_ENVIRONMENT` is present; an explicit
    /// `--http` flag also forces HTTP mode (handled in main).
    pub fn http_mode_from_env() -> bool {
        std::env::var_os("PORT").is_some() || std::env::var_os("RAILWAY_ENVIRONMENT").is_some()
    }
}
