use std::env;
use std::fmt;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_URL: &str = "mongodb://127.0.0.1:27017/crudoperation";

/// bcrypt accepts costs in 4..=31; the crate only exports `DEFAULT_COST`.
pub const MIN_HASH_COST: u32 = 4;
pub const MAX_HASH_COST: u32 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MongoDb,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub store: StoreBackend,
    pub password_hash_cost: u32,
    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.variable, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or blank keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError {
                variable: "PORT",
                message: format!("`{}` is not a valid port ({})", raw, e),
            })?,
            None => DEFAULT_PORT,
        };

        let store = match get("USER_STORE").as_deref() {
            None | Some("mongodb") | Some("mongo") => StoreBackend::MongoDb,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError {
                    variable: "USER_STORE",
                    message: format!("unknown store `{}` (expected mongodb or memory)", other),
                })
            }
        };

        let password_hash_cost = match get("PASSWORD_HASH_COST") {
            Some(raw) => {
                let cost = raw.parse::<u32>().map_err(|e| ConfigError {
                    variable: "PASSWORD_HASH_COST",
                    message: format!("`{}` is not a number ({})", raw, e),
                })?;
                if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&cost) {
                    return Err(ConfigError {
                        variable: "PASSWORD_HASH_COST",
                        message: format!(
                            "must be between {} and {}",
                            MIN_HASH_COST,
                            MAX_HASH_COST
                        ),
                    });
                }
                cost
            }
            None => bcrypt::DEFAULT_COST,
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            store,
            password_hash_cost,
            cors_allowed_origins,
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_match_local_development() {
        let cfg = config(&[]).unwrap();

        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.store, StoreBackend::MongoDb);
        assert_eq!(cfg.password_hash_cost, bcrypt::DEFAULT_COST);
        assert!(cfg.cors_allowed_origins.is_empty());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("PORT", "3002"),
            ("USER_STORE", "memory"),
            ("PASSWORD_HASH_COST", "4"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:3000, http://127.0.0.1:3000,"),
        ])
        .unwrap();

        assert_eq!(cfg.port, 3002);
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert_eq!(cfg.password_hash_cost, 4);
        assert_eq!(
            cfg.cors_allowed_origins,
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = config(&[("PORT", "  "), ("HOST", "")]).unwrap();

        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.host, DEFAULT_HOST);
    }

    #[test]
    fn rejects_bad_values_naming_the_variable() {
        assert_eq!(config(&[("PORT", "http")]).unwrap_err().variable, "PORT");
        assert_eq!(config(&[("USER_STORE", "redis")]).unwrap_err().variable, "USER_STORE");
        assert_eq!(
            config(&[("PASSWORD_HASH_COST", "2")]).unwrap_err().variable,
            "PASSWORD_HASH_COST"
        );
    }

    #[test]
    fn hash_cost_bounds_are_inclusive() {
        let lowest = config(&[("PASSWORD_HASH_COST", "4")]).unwrap();
        assert_eq!(lowest.password_hash_cost, MIN_HASH_COST);

        let highest = config(&[("PASSWORD_HASH_COST", "31")]).unwrap();
        assert_eq!(highest.password_hash_cost, MAX_HASH_COST);

        assert!(config(&[("PASSWORD_HASH_COST", "32")]).is_err());
    }
}
