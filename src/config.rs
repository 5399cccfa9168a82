use std::net::SocketAddr;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_OUTBOUND_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration read from the process environment
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// `BIND_ADDR`
    pub bind_addr: SocketAddr,
    /// `DATABASE_URL`; the in-memory store is used when unset
    pub database_url: Option<String>,
    /// `SESSION_OUTBOUND_BUFFER`: frames a session may have queued before it is dropped
    pub outbound_buffer: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                value: bind_addr.clone(),
                reason: e.to_string(),
            })?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let outbound_buffer = match lookup("SESSION_OUTBOUND_BUFFER") {
            None => DEFAULT_OUTBOUND_BUFFER,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n >= 1 => n,
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        name: "SESSION_OUTBOUND_BUFFER",
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        name: "SESSION_OUTBOUND_BUFFER",
                        value: raw,
                        reason: e.to_string(),
                    })
                }
            },
        };

        Ok(Self {
            bind_addr,
            database_url,
            outbound_buffer,
        })
    }
}
