//! Server configuration loaded from the environment.

use std::str::FromStr;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_UI_ORIGINS: &str = "http://127.0.0.1:3000,http://localhost:3000";

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
    /// PostgreSQL URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
}

impl ServerConfig {
    /// Read `QLARITY_HOST`, `QLARITY_PORT`, `QLARITY_UI_ORIGINS` and `DATABASE_URL`.
    #[cfg_attr(test, allow(dead_code))]
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("QLARITY_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("QLARITY_PORT") {
            Some(raw) => u16::from_str(raw.trim())
                .map_err(|_| format!("QLARITY_PORT must be a u16 number, got {raw:?}"))?,
            None => DEFAULT_PORT,
        };
        let origins = lookup("QLARITY_UI_ORIGINS").unwrap_or_else(|| DEFAULT_UI_ORIGINS.to_string());
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        Ok(Self {
            host,
            port,
            allowed_origins: split_origins(&origins),
            database_url,
        })
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = ServerConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.allowed_origins.len(), 2);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("QLARITY_HOST", "0.0.0.0"),
            ("QLARITY_PORT", "9000"),
            ("QLARITY_UI_ORIGINS", " https://qa.example.com , ,http://localhost:5173"),
            ("DATABASE_URL", "postgres://localhost/qlarity"),
        ]))
        .expect("config");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.allowed_origins,
            vec!["https://qa.example.com", "http://localhost:5173"]
        );
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/qlarity")
        );
    }

    #[test]
    fn blank_database_url_means_memory_store() {
        let config = ServerConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).expect("config");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn rejects_bad_port() {
        let error = ServerConfig::from_lookup(lookup(&[("QLARITY_PORT", "eighty")])).unwrap_err();
        assert!(error.contains("QLARITY_PORT"));
    }
}
