//! # Configuration Module
//!
//! Runtime settings read from the environment (optionally via `.env`).
//!
//! | Variable             | Required | Default          |
//! |----------------------|----------|------------------|
//! | `TELEGRAM_BOT_TOKEN` | yes      |                  |
//! | `ADMIN_IDS`          | no       | none             |
//! | `DATA_STORE_FILE`    | no       | `bot_data.json`  |
//! | `DATABASE_URL`       | no       | in-memory store  |
//! | `DEFAULT_LANGUAGE`   | no       | `en`             |
//! | `LOG_LEVEL`          | no       | `info`           |

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::access::AdminIds;

pub const DEFAULT_DATA_STORE_FILE: &str = "bot_data.json";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub admin_ids: AdminIds,
    /// JSON document holding whitelist, block list and stats
    pub data_store_file: PathBuf,
    /// Postgres URL for the inventory; `None` keeps it in memory
    pub database_url: Option<String>,
    pub default_language: String,
    pub log_level: String,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bot_token = get("TELEGRAM_BOT_TOKEN")
            .ok_or_else(|| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        Ok(Self {
            bot_token,
            admin_ids: AdminIds::parse(&get("ADMIN_IDS").unwrap_or_default()),
            data_store_file: get("DATA_STORE_FILE")
                .unwrap_or_else(|| DEFAULT_DATA_STORE_FILE.to_string())
                .into(),
            database_url: get("DATABASE_URL"),
            default_language: get("DEFAULT_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            log_level: get("LOG_LEVEL")
                .map(|level| level.to_lowercase())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = BotConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert!(config.admin_ids.is_empty());
        assert_eq!(config.data_store_file, PathBuf::from(DEFAULT_DATA_STORE_FILE));
        assert_eq!(config.database_url, None);
        assert_eq!(config.default_language, "en");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_token_is_an_error() {
        assert!(BotConfig::from_lookup(lookup(&[])).is_err());
        assert!(BotConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = BotConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("ADMIN_IDS", "1,2"),
            ("DATABASE_URL", "postgres://localhost/fbdocbot"),
            ("DEFAULT_LANGUAGE", "id"),
            ("LOG_LEVEL", "DEBUG"),
        ]))
        .unwrap();
        assert!(config.admin_ids.contains(1));
        assert!(config.admin_ids.contains(2));
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/fbdocbot")
        );
        assert_eq!(config.default_language, "id");
        assert_eq!(config.log_level, "debug");
    }
}
