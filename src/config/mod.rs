//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, DirectoryConfig, LogFormat, LoggingConfig, NotificationConfig,
    ReviewConfig, ServerConfig, StorageSettings,
};
