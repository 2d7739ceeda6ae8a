use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_SECRET: &str = "DOYOUREALLYTHINKIEXPOSESECRETS?";
const DEFAULT_MIRROR_BIN: &str = "/usr/local/bin/mirror";
const DEFAULT_MIRROR_SYNC_BIN: &str = "/usr/local/bin/mirror-sync";
const DEFAULT_REPO_ROOT: &str = "/root/shifoogit/repos";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 53981;

/// Settings read once at startup. Never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub webhook_secret: String,
    pub mirror_bin: String,
    pub mirror_sync_bin: String,
    pub repo_root: PathBuf,
    pub listen_addr: SocketAddr,
    /// `None` lets external commands run for as long as they need.
    pub command_timeout: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let bind = or("BIND_ADDR", DEFAULT_BIND_ADDR);
        let ip: IpAddr = bind.parse().map_err(|_| ConfigError::InvalidValue {
            key: "BIND_ADDR",
            value: bind.clone(),
        })?;

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let command_timeout = match get("MIRROR_COMMAND_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: "MIRROR_COMMAND_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => None,
        };

        Ok(AppConfig {
            webhook_secret: or("WEBHOOK_SECRET", DEFAULT_SECRET),
            mirror_bin: or("MIRROR_BIN", DEFAULT_MIRROR_BIN),
            mirror_sync_bin: or("MIRROR_SYNC_BIN", DEFAULT_MIRROR_SYNC_BIN),
            repo_root: PathBuf::from(or("REPO_ROOT", DEFAULT_REPO_ROOT)),
            listen_addr: SocketAddr::new(ip, port),
            command_timeout,
        })
    }
}

pub struct AppState {
    pub config: AppConfig,
}

pub fn build_app_state() -> Result<AppState, ConfigError> {
    Ok(AppState {
        config: AppConfig::from_env()?,
    })
}
