//! Storefront configuration, from command-line flags or `STOREFRONT_*` environment
//! variables. A `.env` file in the working directory is read first when present.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which backend the storefront talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// The in-process reference backend.
    #[default]
    Local,
    /// A REST backend at `--api-url`.
    Http,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "storefront-demo", about = "Storefront client state demo", long_about = None)]
pub struct StorefrontConfig {
    #[arg(long, env = "STOREFRONT_BACKEND", value_enum, default_value_t = BackendKind::Local)]
    pub backend: BackendKind,

    /// Base URL of the REST backend
    #[arg(
        long,
        env = "STOREFRONT_API_URL",
        default_value = "http://localhost:5000/api"
    )]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "STOREFRONT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Directory for cart and session files; state is kept in memory when omitted
    #[arg(long, env = "STOREFRONT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            api_url: "http://localhost:5000/api".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: None,
        }
    }
}

impl StorefrontConfig {
    /// Loads `.env` if present, then parses flags and environment.
    pub fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();
        Self::try_parse()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = StorefrontConfig::try_parse_from([
            "storefront-demo",
            "--backend",
            "http",
            "--api-url",
            "https://shop.example.com/api",
            "--timeout-secs",
            "5",
        ])
        .unwrap();
        assert_eq!(config.backend, BackendKind::Http);
        assert_eq!(config.api_url, "https://shop.example.com/api");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.data_dir, None);
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let config = StorefrontConfig {
            timeout_secs: 0,
            ..StorefrontConfig::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }
}
