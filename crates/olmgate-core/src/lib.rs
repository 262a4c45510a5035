pub mod app_config;
pub mod config;
pub mod error;
pub mod sync_config;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use sync_config::{SyncConfigStore, SyncJobConfig};
