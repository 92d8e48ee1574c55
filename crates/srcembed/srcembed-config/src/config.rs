use serde::Deserialize;
use srcembed_stream::{StreamConfig, WaitPolicy};
use std::path::Path;
use tracing::{debug, warn};

/// Environment variable naming the config file. Unset means built-in defaults.
pub const CONFIG_ENV: &str = "SRCEMBED_CONFIG";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SrcembedConfig {
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default = "defaults::half_capacity")]
    pub half_capacity: usize,
    #[serde(default)]
    pub wait: WaitMode,
    #[serde(default)]
    pub input: InputMode,
    #[serde(default)]
    pub huge_page_align: bool,
}

#[derive(Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WaitMode {
    #[default]
    Spin,
    Block,
}

/// How stdin is consumed.
#[derive(Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Map stdin when it is a non-empty regular file, stream it otherwise.
    #[default]
    Auto,
    /// Always go through the double-buffered stream.
    Buffered,
    /// Prefer the mapping; still falls back when stdin cannot be mapped.
    Mapped,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

mod defaults {
    pub fn log_level() -> String {
        "warn".into()
    }

    pub fn half_capacity() -> usize {
        srcembed_stream::DEFAULT_HALF_CAPACITY
    }
}

impl Default for SrcembedConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level(),
            half_capacity: defaults::half_capacity(),
            wait: WaitMode::default(),
            input: InputMode::default(),
            huge_page_align: false,
        }
    }
}

impl From<WaitMode> for WaitPolicy {
    fn from(mode: WaitMode) -> Self {
        match mode {
            WaitMode::Spin => WaitPolicy::Spin,
            WaitMode::Block => WaitPolicy::Block,
        }
    }
}

impl SrcembedConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_to_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&toml_to_str)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: SrcembedConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by [`CONFIG_ENV`], or defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => {
                debug!(%path, "loading config");
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.half_capacity == 0 {
            return Err(ConfigError::Invalid("half_capacity must be non-zero".into()));
        }
        Ok(())
    }

    /// Engine settings for both directions.
    ///
    /// With `huge_page_align` the half capacity is rounded up to the host's
    /// huge page size; hosts without one keep the configured value.
    pub fn stream_config(&self) -> StreamConfig {
        let mut half_capacity = self.half_capacity;
        if self.huge_page_align {
            match srcembed_sys::huge_page_size() {
                Ok(Some(page)) => half_capacity = srcembed_sys::round_up(half_capacity, page),
                Ok(None) => debug!("no huge page size reported"),
                Err(e) => warn!(error = %e, "huge page size unavailable"),
            }
        }
        StreamConfig::new(half_capacity).with_wait(self.wait.into())
    }
}
