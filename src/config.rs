use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,

    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub db_idle_timeout_secs: u64,

    pub jwt_secret: String,
    pub jwt_expires_in_days: i64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "5000"),
            db_host: try_load("DB_HOST", "localhost"),
            db_port: try_load("DB_PORT", "5432"),
            db_name: try_load("DB_NAME", "rentora"),
            db_user: try_load("DB_USER", "postgres"),
            db_password: try_load("DB_PASSWORD", "postgres"),
            db_max_connections: try_load("DB_MAX_CONNECTIONS", "10"),
            db_min_connections: try_load("DB_MIN_CONNECTIONS", "0"),
            db_acquire_timeout_secs: try_load("DB_ACQUIRE_TIMEOUT_SECS", "30"),
            db_idle_timeout_secs: try_load("DB_IDLE_TIMEOUT_SECS", "600"),
            jwt_secret: load_secret("JWT_SECRET"),
            jwt_expires_in_days: try_load("JWT_EXPIRES_IN_DAYS", "3"),
        }
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn load_secret(key: &str) -> String {
    var(key).unwrap_or_else(|_| {
        warn!("{key} not set, falling back to an insecure development secret");
        "privatekey".to_string()
    })
}
