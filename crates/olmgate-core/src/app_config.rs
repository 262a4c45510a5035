use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub olmed_base_url: String,
    pub olmed_username: String,
    pub olmed_password: String,
    pub scheduler_tick_secs: u64,
    pub http_timeout_secs: u64,
    pub token_refresh_margin_secs: u64,
    pub auth_max_retries: u32,
    pub auth_retry_base_ms: u64,
    pub product_sync_path: PathBuf,
    pub order_sync_path: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("olmed_base_url", &self.olmed_base_url)
            .field("olmed_username", &self.olmed_username)
            .field("olmed_password", &"[redacted]")
            .field("scheduler_tick_secs", &self.scheduler_tick_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field(
                "token_refresh_margin_secs",
                &self.token_refresh_margin_secs,
            )
            .field("auth_max_retries", &self.auth_max_retries)
            .field("auth_retry_base_ms", &self.auth_retry_base_ms)
            .field("product_sync_path", &self.product_sync_path)
            .field("order_sync_path", &self.order_sync_path)
            .finish()
    }
}
