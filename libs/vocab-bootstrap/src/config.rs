//! Layered application configuration.
//!
//! Sources are merged in this order, later sources winning:
//! 1. built-in defaults
//! 2. YAML file (explicit `--config` path, otherwise `config/config.yaml` when present)
//! 3. legacy deployment variables (`DB_HOST`, `SALT`, ...), only when `ENV=prod`
//! 4. `APP__`-prefixed environment variables, `__` separating nested keys
//! 5. CLI overrides (see [`AppConfig::apply_cli_overrides`])

use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;

/// Config file picked up when no explicit path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

const REDACTED: &str = "***REDACTED***";

/// Legacy variable names understood in production mode, with their config paths.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("DB_HOST", "database.host"),
    ("DB_PORT", "database.port"),
    ("DB_USER", "database.user"),
    ("DB_PASSWORD", "database.password"),
    ("DB_NAME", "database.name"),
    ("ES_URL", "modules.vocabulary.elastic.url"),
    ("ES_USERNAME", "modules.vocabulary.elastic.username"),
    ("ES_PASSWORD", "modules.vocabulary.elastic.password"),
    ("SALT", "modules.vocabulary.auth.secret"),
    ("HS_HASH", "modules.vocabulary.auth.hash_cost"),
    ("AWS_ID", "modules.vocabulary.aws.access_key_id"),
    ("AWS_SECRET", "modules.vocabulary.aws.secret_access_key"),
    ("AWS_REGION", "modules.vocabulary.aws.region"),
];

/// Top-level configuration of the server process.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    /// Per-module sections, parsed by the owning module.
    pub modules: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub request_timeout_secs: u64,
    /// Empty list allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_owned(),
            request_timeout_secs: 30,
            cors_allowed_origins: Vec::new(),
        }
    }
}

/// Relational store connection settings.
///
/// `dsn` takes precedence over the discrete fields when set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub dsn: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            host: "localhost".to_owned(),
            port: 5432,
            user: "postgres".to_owned(),
            password: String::new(),
            name: "vocabulary".to_owned(),
            max_connections: 10,
        }
    }
}

impl DatabaseConfig {
    /// Build the connection string for the configured store.
    ///
    /// # Errors
    /// Returns an error if the host cannot form a valid URL.
    pub fn connection_string(&self) -> Result<String> {
        if let Some(dsn) = self.dsn.as_deref().filter(|d| !d.trim().is_empty()) {
            return Ok(dsn.to_owned());
        }

        let mut url = url::Url::parse(&format!("postgres://{}", self.host))
            .with_context(|| format!("invalid database host '{}'", self.host))?;
        url.set_port(Some(self.port))
            .map_err(|()| anyhow::anyhow!("cannot set port on database url"))?;
        url.set_username(&self.user)
            .map_err(|()| anyhow::anyhow!("cannot set user on database url"))?;
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|()| anyhow::anyhow!("cannot set password on database url"))?;
        }
        url.set_path(&self.name);
        Ok(url.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

/// Command-line values that override file and environment configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub port: Option<u16>,
    pub verbose: u8,
}

impl AppConfig {
    /// Load configuration from every layer.
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed or the result is invalid.
    pub fn load_layered(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        figment = match config_path {
            Some(path) => figment.merge(Yaml::file(path)),
            None => figment.merge(Yaml::file(DEFAULT_CONFIG_PATH)),
        };

        if legacy_prod_mode() {
            figment = figment.merge(legacy_env());
        }

        let config: Self = figment
            .merge(Env::prefixed("APP__").split("__"))
            .extract()
            .context("failed to build configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides on top of the loaded layers.
    ///
    /// # Errors
    /// Returns an error if `server.bind_addr` is not a socket address.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) -> Result<()> {
        if let Some(port) = args.port {
            let mut addr = self.bind_socket_addr()?;
            addr.set_port(port);
            self.server.bind_addr = addr.to_string();
        }

        match args.verbose {
            0 => {}
            1 => "info".clone_into(&mut self.logging.level),
            2 => "debug".clone_into(&mut self.logging.level),
            _ => "trace".clone_into(&mut self.logging.level),
        }
        Ok(())
    }

    /// Parsed `server.bind_addr`.
    ///
    /// # Errors
    /// Returns an error if the address is malformed.
    pub fn bind_socket_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind_addr
            .parse()
            .with_context(|| format!("invalid server.bind_addr '{}'", self.server.bind_addr))
    }

    /// Deserialize the section of module `name`, or its defaults when absent.
    ///
    /// # Errors
    /// Returns an error if the section does not match `T`.
    pub fn module_config<T>(&self, name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.modules.get(name) {
            Some(raw) => serde_json::from_value(raw.clone())
                .with_context(|| format!("invalid configuration for module '{name}'")),
            None => Ok(T::default()),
        }
    }

    /// Render the effective configuration as YAML with secrets masked.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_redacted_yaml(&self) -> Result<String> {
        let mut value = serde_json::to_value(self).context("failed to serialize configuration")?;
        redact_secrets(&mut value);
        serde_saphyr::to_string(&value).context("failed to render configuration as YAML")
    }

    fn validate(&self) -> Result<()> {
        self.bind_socket_addr()?;
        if self.server.request_timeout_secs == 0 {
            bail!("server.request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

fn legacy_prod_mode() -> bool {
    std::env::var("ENV").is_ok_and(|v| v.eq_ignore_ascii_case("prod"))
}

fn legacy_env() -> Env {
    Env::raw().filter_map(|key| {
        LEGACY_ENV
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, path)| (*path).into())
    })
}

fn redact_secrets(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                let sensitive = key.contains("password") || key.contains("secret");
                if sensitive && entry.as_str().is_some_and(|s| !s.is_empty()) {
                    *entry = serde_json::Value::String(REDACTED.to_owned());
                } else if key == "dsn" {
                    if let Some(dsn) = entry.as_str().and_then(redact_dsn_password) {
                        *entry = serde_json::Value::String(dsn);
                    }
                } else {
                    redact_secrets(entry);
                }
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(redact_secrets),
        _ => {}
    }
}

fn redact_dsn_password(dsn: &str) -> Option<String> {
    let mut url = url::Url::parse(dsn).ok()?;
    url.password()?;
    url.set_password(Some(REDACTED)).ok()?;
    Some(url.to_string())
}
