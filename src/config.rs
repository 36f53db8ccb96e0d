//! Runtime configuration read from the environment (and `.env` via dotenv).

use crate::error::{Error, Result};
use crate::processing::MaskPolicy;
use chrono_tz::Tz;
use std::path::PathBuf;

pub const ENV_STORE: &str = "SUBNET_LEDGER_STORE";
pub const ENV_LOG_CONFIG: &str = "SUBNET_LEDGER_LOG_CONFIG";
pub const ENV_STRICT_MASK: &str = "SUBNET_LEDGER_STRICT_MASK";
pub const ENV_TZ: &str = "SUBNET_LEDGER_TZ";

pub const DEFAULT_STORE: &str = "subnet_ledger.json";
pub const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";
pub const DEFAULT_TZ: Tz = chrono_tz::Pacific::Auckland;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON ledger file.
    pub store_path: PathBuf,
    /// log4rs YAML file.
    pub log_config: PathBuf,
    pub mask_policy: MaskPolicy,
    /// Timezone for displaying registration times.
    pub display_tz: Tz,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store_path: PathBuf::from(DEFAULT_STORE),
            log_config: PathBuf::from(DEFAULT_LOG_CONFIG),
            mask_policy: MaskPolicy::Loose,
            display_tz: DEFAULT_TZ,
        }
    }
}

impl Config {
    /// Build from process environment variables, falling back to defaults.
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let mut config = Config::default();
        if let Some(path) = lookup(ENV_STORE) {
            config.store_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_LOG_CONFIG) {
            config.log_config = PathBuf::from(path);
        }
        if let Some(flag) = lookup(ENV_STRICT_MASK) {
            config.mask_policy = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => MaskPolicy::Strict,
                "0" | "false" | "no" | "" => MaskPolicy::Loose,
                other => {
                    return Err(Error::Config(format!(
                        "{ENV_STRICT_MASK} must be true or false, got '{other}'"
                    )))
                }
            };
        }
        if let Some(tz) = lookup(ENV_TZ) {
            config.display_tz = tz
                .parse()
                .map_err(|e| Error::Config(format!("{ENV_TZ}: {e}")))?;
        }
        log::debug!("config: {config:?}");
        Ok(config)
    }
}
