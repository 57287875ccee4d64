//! Application configuration.
//!
//! Values come from built-in defaults, then an optional `boxworks.toml`,
//! then `BOXWORKS_*` environment variables (nested keys use `__`, e.g.
//! `BOXWORKS_LABEL__WIDTH_MM=80`).

use chrono::FixedOffset;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::format::parse_offset;

const CONFIG_FILE: &str = "boxworks.toml";
const ENV_PREFIX: &str = "BOXWORKS_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the web server listens on
    pub bind_addr: String,

    /// Base URL of the remote REST API, without a trailing slash
    pub api_base_url: String,

    /// Per-request timeout for remote calls; transport default when unset
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// UTC offset used to render timestamps, e.g. `+05:30`
    pub display_offset: String,

    pub label: LabelConfig,

    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

/// Physical sticker dimensions and print window behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    pub width_mm: u32,
    pub height_mm: u32,
    /// Delay before the print window closes itself
    pub close_delay_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender mailbox, e.g. `Website <noreply@example.com>`
    pub from: String,
    /// Mailbox that receives contact enquiries
    pub inbox: String,
}

fn default_smtp_port() -> u16 {
    465
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "127.0.0.1:3000".to_string(),
            api_base_url: "http://127.0.0.1:8080".to_string(),
            request_timeout_secs: None,
            display_offset: "+05:30".to_string(),
            label: LabelConfig::default(),
            smtp: None,
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        LabelConfig {
            width_mm: 100,
            height_mm: 75,
            close_delay_ms: 500,
        }
    }
}

impl Config {
    /// Load from defaults, `boxworks.toml` and the environment
    pub fn load() -> Result<Self, AppError> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, AppError> {
        let mut config: Config = figment
            .extract()
            .map_err(|e| AppError::Config(e.to_string()))?;
        config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();
        config.offset()?;
        Ok(config)
    }

    pub fn offset(&self) -> Result<FixedOffset, AppError> {
        parse_offset(&self.display_offset).ok_or_else(|| {
            AppError::Config(format!("invalid display_offset {:?}", self.display_offset))
        })
    }
}
