mod config;

pub use config::{CONFIG_ENV, ConfigError, InputMode, SrcembedConfig, WaitMode};
