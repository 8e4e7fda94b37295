use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

/// Runtime configuration. Defaults are overridden by raw environment
/// variables (`DATABASE_URL`, `LISTEN_ADDR`, `LOGLEVEL`, `MAX_CONNECTIONS`,
/// `ENABLE_WEB_UI`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub loglevel: String,
    pub max_connections: u32,
    /// Mounts the server-rendered page at `/`. Off unless asked for.
    pub enable_web_ui: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:inventory.db".to_string(),
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            max_connections: 5,
            enable_web_ui: false,
        }
    }
}

impl Config {
    const ENV_KEYS: [&'static str; 5] = [
        "database_url",
        "listen_addr",
        "loglevel",
        "max_connections",
        "enable_web_ui",
    ];

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(&Self::ENV_KEYS))
    }

    pub fn from_env() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}
