//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via the `-f` flag or the
//! `POKEGATE_CONFIG` environment variable.
//!
//! ## Loading Priority
//!
//! Sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`, silently skipped if absent)
//! 2. **Environment variables** - Variables prefixed with `POKEGATE_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `POKEGATE_DOWNSTREAM__URL=http://127.0.0.1:80/` sets the `downstream.url` field.
//!
//! Every field defaults to the constants the service originally shipped with, so running without
//! any configuration reproduces the stock deployment: gateway on port 3000, image processor at
//! `http://localhost:80/`, chat relay disabled.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying the config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "POKEGATE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Downstream image-processing service that `/image` uploads are forwarded to
    pub downstream: DownstreamConfig,
    /// Chat relay configuration; the `/chat` route only exists when enabled
    pub chat: ChatConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            downstream: DownstreamConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

/// Where and how images are forwarded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownstreamConfig {
    /// Base URL of the downstream service; the gateway POSTs to `<url>/image`
    pub url: Url,
    /// Maximum accepted size, in bytes, for a raw `application/octet-stream`
    /// upload. Multipart uploads are not capped.
    pub max_raw_bytes: usize,
}

impl DownstreamConfig {
    /// 20 MiB, the cap the service has always enforced on raw uploads
    const DEFAULT_MAX_RAW_BYTES: usize = 20 * 1024 * 1024;
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            url: Url::parse("http://localhost:80/").expect("default downstream URL is valid"),
            max_raw_bytes: Self::DEFAULT_MAX_RAW_BYTES,
        }
    }
}

/// The local text-generation backend behind `/chat`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatConfig {
    /// Register the `/chat` route. Deployments without the chat relay leave this off.
    pub enabled: bool,
    /// Base URL of the generation backend (an Ollama-compatible `/api/generate`)
    pub url: Url,
    /// Model name passed to the backend
    pub model: String,
    /// Sampling temperature; kept low so answers are near-deterministic
    pub temperature: f32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: Url::parse("http://localhost:11434/").expect("default backend URL is valid"),
            model: "phi3.5".to_string(),
            temperature: 0.2,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("POKEGATE_").split("__"))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.chat.enabled && self.chat.model.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: chat is enabled but chat.model is empty".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: chat.temperature must be between 0.0 and 2.0, got {}",
                    self.chat.temperature
                ),
            });
        }

        if self.downstream.max_raw_bytes == 0 {
            return Err(Error::Internal {
                operation: "Config validation: downstream.max_raw_bytes must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
