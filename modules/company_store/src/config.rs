use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

/// Configuration for the company_store module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default = "default_initial_balance")]
    pub initial_balance: i64,
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl", with = "humantime_serde")]
    pub token_ttl: Duration,
    #[serde(default = "default_transaction_timeout", with = "humantime_serde")]
    pub transaction_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_balance: default_initial_balance(),
            jwt_secret: default_jwt_secret(),
            token_ttl: default_token_ttl(),
            transaction_timeout: default_transaction_timeout(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.initial_balance < 0 {
            anyhow::bail!("initial_balance must not be negative");
        }
        if self.jwt_secret.is_empty() {
            anyhow::bail!("jwt_secret must not be empty");
        }
        if self.token_ttl.is_zero() || self.transaction_timeout.is_zero() {
            anyhow::bail!("token_ttl and transaction_timeout must be non-zero");
        }
        Ok(())
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl From<&StoreConfig> for ServiceConfig {
    fn from(cfg: &StoreConfig) -> Self {
        Self {
            initial_balance: cfg.initial_balance,
            jwt_secret: cfg.jwt_secret.clone(),
            token_ttl: cfg.token_ttl,
            transaction_timeout: cfg.transaction_timeout,
        }
    }
}

fn default_initial_balance() -> i64 {
    1000
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_token_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_transaction_timeout() -> Duration {
    Duration::from_secs(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humantime_fields_parse() {
        let cfg: StoreConfig = serde_json::from_value(serde_json::json!({
            "initial_balance": 500,
            "jwt_secret": "s",
            "token_ttl": "2h",
            "transaction_timeout": "750ms"
        }))
        .unwrap();
        assert_eq!(cfg.initial_balance, 500);
        assert_eq!(cfg.token_ttl, Duration::from_secs(7200));
        assert_eq!(cfg.transaction_timeout, Duration::from_millis(750));
        cfg.validate().unwrap();
    }

    #[test]
    fn empty_bag_gets_defaults() {
        let cfg: StoreConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.initial_balance, 1000);
        assert_eq!(cfg.token_ttl, Duration::from_secs(86400));
        assert!(cfg.uses_default_secret());
    }

    #[test]
    fn unknown_keys_rejected() {
        let res: Result<StoreConfig, _> =
            serde_json::from_value(serde_json::json!({ "initial_coins": 5 }));
        assert!(res.is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cfg = StoreConfig {
            jwt_secret: String::new(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = StoreConfig {
            initial_balance: -1,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
