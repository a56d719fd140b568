//! Engine and server settings. Defaults, overridable from the environment.

use std::str::FromStr;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineConfig {
    /// Attempts per transaction before a conflict surfaces as `Internal`.
    pub max_transaction_attempts: u32,
    /// Whether brackets get a third-place match unless the request says otherwise.
    pub default_consolation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_transaction_attempts: 5,
            default_consolation: true,
        }
    }
}

impl EngineConfig {
    /// Reads BRACKET_MAX_TX_ATTEMPTS and BRACKET_CONSOLATION.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_transaction_attempts: env_or("BRACKET_MAX_TX_ATTEMPTS", d.max_transaction_attempts),
            default_consolation: env_or("BRACKET_CONSOLATION", d.default_consolation),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Reads HOST and PORT.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(d.host),
            port: env_or("PORT", d.port),
        }
    }
}

/// Parse `key` from the environment; missing or unparsable values fall back to `default`.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring unparsable {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}
