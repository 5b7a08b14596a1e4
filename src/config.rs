use serde::{Deserialize, Serialize};

use crate::audio::codec::CodecParams;
use crate::audio::constants;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory of the static web client, served next to `/ws`.
    pub static_dir: String,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            static_dir: "web".into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u8,
    pub frame_ms: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: constants::SAMPLE_RATE,
            channels: constants::CHANNELS,
            frame_ms: constants::FRAME_MS,
        }
    }
}

impl From<&AudioConfig> for CodecParams {
    fn from(a: &AudioConfig) -> Self {
        Self {
            sample_rate: a.sample_rate,
            channels: a.channels,
            frame_ms: a.frame_ms,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_str = std::fs::read_to_string("config.toml").unwrap_or_else(|_| "".to_string());
        if config_str.is_empty() {
            return Err("config.toml not found or empty".into());
        }
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }
}
