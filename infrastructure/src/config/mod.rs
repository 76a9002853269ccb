//! Configuration loading

pub mod file_config;
pub mod loader;

pub use file_config::{
    ConfigError, FileAgentConfig, FileCarryConfig, FileConfig, FileLogConfig, FileServerConfig,
};
pub use loader::ConfigLoader;
