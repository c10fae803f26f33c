//! Application settings.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `settings.toml` in the working directory (optional)
//! 3. `PARTAGE_*` environment variables, `__` between levels
//!    (`PARTAGE_SERVER__PORT=8080`)
//! 4. `FRONTEND_URL`, the origin of the browser front-end
//!
//! ```toml
//! [app]
//! level = "debug"
//! locale = "fr-FR"
//!
//! [server]
//! port = 3000
//! frontend_url = "http://localhost:5173"
//! cors = "strict"
//!
//! [database]
//! sqlite = "./partage.db"
//!
//! [auth]
//! expose_login_code = true
//! ```

use config::{Config, ConfigError, Environment, File};
use engine::Locale;
use serde::Deserialize;
use server::CorsMode;

const SETTINGS_FILE: &str = "settings";
const ENV_PREFIX: &str = "PARTAGE";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
    pub locale: Locale,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            locale: Locale::FrFr,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors: CorsMode,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            frontend_url: "http://localhost:5173".to_string(),
            cors: CorsMode::Strict,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("./partage.db".to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Auth {
    pub login_code_ttl_minutes: i64,
    pub session_ttl_hours: i64,
    /// Local development only: return login codes in API responses.
    pub expose_login_code: bool,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            login_code_ttl_minutes: 15,
            session_ttl_hours: 24 * 30,
            expose_login_code: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub database: Database,
    pub auth: Auth,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(SETTINGS_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::finish(builder, std::env::var("FRONTEND_URL").ok())
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        frontend_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        let frontend_url = frontend_url.filter(|url| !url.trim().is_empty());
        builder
            .set_override_option("server.frontend_url", frontend_url)?
            .build()?
            .try_deserialize()
    }

    /// Settings for the HTTP layer.
    pub fn server_config(&self) -> server::ServerConfig {
        server::ServerConfig {
            bind: self.server.bind.clone(),
            port: self.server.port,
            frontend_url: self.server.frontend_url.clone(),
            cors: self.server.cors,
            locale: self.app.locale,
            expose_login_code: self.auth.expose_login_code,
        }
    }
}
