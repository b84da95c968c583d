use std::env;
use std::net::SocketAddr;

use crate::error::ConfigError;

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub frontend_origin: String,
    /// No URI means tasks live only in process memory.
    pub mongo_uri: Option<String>,
    pub database_name: String,
    pub tasks_collection: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let bind_addr = bind_raw.parse().map_err(|e| ConfigError::InvalidVar {
            var: "BIND_ADDR",
            message: format!("'{}': {}", bind_raw, e),
        })?;

        Ok(Self {
            bind_addr,
            frontend_origin: lookup("FRONTEND_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            mongo_uri: lookup("MONGO_URI").filter(|uri| !uri.trim().is_empty()),
            database_name: lookup("DATABASE_NAME").unwrap_or_else(|| "print_shop".to_string()),
            tasks_collection: lookup("TASKS_COLLECTION").unwrap_or_else(|| "tasks".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_in_memory_storage() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.frontend_origin, "http://localhost:3000");
        assert!(cfg.mongo_uri.is_none());
        assert_eq!(cfg.database_name, "print_shop");
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:9090"),
            ("MONGO_URI", "mongodb://db:27017"),
            ("TASKS_COLLECTION", "board_tasks"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9090);
        assert_eq!(cfg.mongo_uri.as_deref(), Some("mongodb://db:27017"));
        assert_eq!(cfg.tasks_collection, "board_tasks");
    }

    #[test]
    fn rejects_a_bad_bind_address() {
        assert!(matches!(
            config(&[("BIND_ADDR", "localhost")]),
            Err(ConfigError::InvalidVar { var: "BIND_ADDR", .. })
        ));
    }
}
