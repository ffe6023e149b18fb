use crate::leave_balance::calculator::SnapshotMode;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// How long policy and allocation reads stay cached
    pub policy_cache_ttl_secs: u64,
    pub balance_snapshot_mode: SnapshotMode,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        fn parsed<T>(value: Option<String>, key: &str, default: T) -> Result<T>
        where
            T: FromStr,
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            match value {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{key} has an invalid value: {raw}")),
                None => Ok(default),
            }
        }
        let opt = |key: &str| lookup(key);

        let balance_snapshot_mode = match opt("BALANCE_SNAPSHOT_MODE") {
            Some(raw) => SnapshotMode::from_str(raw.trim())
                .map_err(|_| anyhow!("BALANCE_SNAPSHOT_MODE must be per_type or exclusive, got {raw}"))?,
            None => SnapshotMode::default(),
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed(opt("ACCESS_TOKEN_TTL"), "ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parsed(opt("REFRESH_TOKEN_TTL"), "REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parsed(opt("RATE_LOGIN_PER_MIN"), "RATE_LOGIN_PER_MIN", 60)?,
            rate_refresh_per_min: parsed(opt("RATE_REFRESH_PER_MIN"), "RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parsed(
                opt("RATE_PROTECTED_PER_MIN"),
                "RATE_PROTECTED_PER_MIN",
                1000,
            )?,

            api_prefix: opt("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            policy_cache_ttl_secs: parsed(opt("POLICY_CACHE_TTL_SECS"), "POLICY_CACHE_TTL_SECS", 300)?,
            balance_snapshot_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SERVER_ADDR", "127.0.0.1:8080"),
        ("DATABASE_URL", "mysql://root@localhost/leavedesk"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_fill_optional_values() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.access_token_ttl, 900);
        assert_eq!(config.refresh_token_ttl, 604_800);
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.policy_cache_ttl_secs, 300);
        assert_eq!(config.balance_snapshot_mode, SnapshotMode::PerType);
    }

    #[test]
    fn missing_required_value_is_an_error() {
        let err = Config::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ACCESS_TOKEN_TTL", "soon"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN_TTL"));
    }

    #[test]
    fn snapshot_mode_is_configurable() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("BALANCE_SNAPSHOT_MODE", "exclusive"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.balance_snapshot_mode, SnapshotMode::Exclusive);

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("BALANCE_SNAPSHOT_MODE", "merge"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }
}
