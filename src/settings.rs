use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "FAMILY";

impl Settings {
    /// Defaults, then `path` if it exists, then `FAMILY_*` variables.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        Self::builder(path)?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    fn builder(path: &str) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let default = Settings::default();

        Ok(Config::builder()
            .set_default("address", default.address)?
            .set_default("port", i64::from(default.port))?
            .set_default("log_level", default.log_level)?
            .set_default("database.url", default.database.url)?
            .set_default("database.max_connections", i64::from(default.database.max_connections))?
            .add_source(File::with_name(path).required(false)))
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: "sqlite://family.db".to_owned(),
            max_connections: 5,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_owned(),
            port: 8080,
            log_level: "info".to_owned(),
            database: Database::default(),
            tls: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

/// PEM files for serving over rustls.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Tls {
    pub cert: String,
    pub key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub address: String,
    pub port: u16,
    pub log_level: String,
    pub database: Database,
    pub tls: Option<Tls>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = Settings::builder("does-not-exist.toml")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<Settings>()
            .unwrap();

        assert_eq!(settings.socket_addr(), "0.0.0.0:8080");
        assert_eq!(settings.database.url, "sqlite://family.db");
        assert_eq!(settings.database.max_connections, 5);
        assert!(settings.tls.is_none());
    }

    #[test]
    fn file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("family-settings-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "port = 9000\n[database]\nurl = \"sqlite://other.db\"\n[tls]\ncert = \"cert.pem\"\nkey = \"key.pem\""
        )
        .unwrap();

        let settings = Settings::builder(path.to_str().unwrap())
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<Settings>()
            .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings.port, 9000);
        assert_eq!(settings.address, "0.0.0.0");
        assert_eq!(settings.database.url, "sqlite://other.db");
        assert_eq!(settings.tls.unwrap().cert, "cert.pem");
    }

    #[test]
    fn environment_overrides_defaults() {
        std::env::set_var("FAMILY_PORT", "9100");
        std::env::set_var("FAMILY_DATABASE__MAX_CONNECTIONS", "7");

        let settings = Settings::new("does-not-exist.toml");

        std::env::remove_var("FAMILY_PORT");
        std::env::remove_var("FAMILY_DATABASE__MAX_CONNECTIONS");

        let settings = settings.unwrap();
        assert_eq!(settings.port, 9100);
        assert_eq!(settings.database.max_connections, 7);
        assert_eq!(settings.database.url, "sqlite://family.db");
    }
}
