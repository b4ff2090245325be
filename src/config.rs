use anyhow::{Context, Result};
use serde::Deserialize;

use crate::session::BusyPolicy;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub inference: InferenceSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Settings for the remote vision-inference capability.
///
/// Read once at startup and shared read-only by every session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Base URL of an OpenAI-compatible API (without the `/chat/completions` suffix)
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Frames larger than this in either dimension are downscaled
    pub max_image_dimension: u32,
    pub jpeg_quality: u8,
    pub max_tokens: u32,
    pub temperature: f32,
    pub connect_timeout_secs: u64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_image_dimension: 1024,
            jpeg_quality: 75,
            max_tokens: 500,
            temperature: 0.3,
            connect_timeout_secs: 10,
        }
    }
}

/// Defaults applied to every new streaming session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Sampling interval before the client sends `configure`
    pub default_interval: u32,
    pub inference_timeout_secs: u64,
    pub busy_policy: BusyPolicy,
    pub throttle_backoff_base_ms: u64,
    pub throttle_backoff_max_ms: u64,
    /// Capacity of the per-session outbound message channel
    pub outbound_buffer: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_interval: 1,
            inference_timeout_secs: 20,
            busy_policy: BusyPolicy::Queue,
            throttle_backoff_base_ms: 1_000,
            throttle_backoff_max_ms: 30_000,
            outbound_buffer: 64,
        }
    }
}

impl Config {
    /// Load configuration from `path` (any format the `config` crate understands),
    /// overridden by `DROWSY__SECTION__KEY` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("DROWSY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        let cfg: Self = settings
            .try_deserialize()
            .context("Failed to deserialize config")?;

        if cfg.session.default_interval == 0 {
            anyhow::bail!("session.default_interval must be at least 1");
        }
        if cfg.session.inference_timeout_secs == 0 {
            anyhow::bail!("session.inference_timeout_secs must be at least 1");
        }
        if cfg.session.outbound_buffer == 0 {
            anyhow::bail!("session.outbound_buffer must be at least 1");
        }

        Ok(cfg)
    }
}
