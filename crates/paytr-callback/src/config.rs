use std::env;

use paytr::{ConfigError, MerchantConfig};

const DEFAULT_PORT: u16 = 4030;
const DEFAULT_LEDGER_PATH: &str = "./paytr-ledger.db";
const DEFAULT_CLAIM_TTL_SECS: u64 = 300;
const DEFAULT_LEDGER_RETENTION_SECS: u64 = 30 * 24 * 60 * 60;

/// Where processed notifications are recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerBackend {
    /// `PAYTR_LEDGER_PATH=memory`. Redeliveries after a restart re-run the handler.
    Memory,
    Sqlite(String),
}

/// Callback server configuration.
#[derive(Clone)]
pub struct CallbackConfig {
    pub merchant: MerchantConfig,
    pub port: u16,
    pub ledger: LedgerBackend,
    /// Seconds an unfinished claim blocks redeliveries of the same order.
    pub claim_ttl_secs: u64,
    /// Seconds a processed order is remembered for duplicate detection.
    pub ledger_retention_secs: u64,
    pub metrics_token: Option<Vec<u8>>,
    pub public_metrics: bool,
}

impl std::fmt::Debug for CallbackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackConfig")
            .field("merchant", &self.merchant)
            .field("port", &self.port)
            .field("ledger", &self.ledger)
            .field("claim_ttl_secs", &self.claim_ttl_secs)
            .field("ledger_retention_secs", &self.ledger_retention_secs)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("public_metrics", &self.public_metrics)
            .finish()
    }
}

impl CallbackConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let merchant = MerchantConfig::from_lookup(&lookup)?;

        let (port_var, port) = match get("PAYTR_CALLBACK_PORT") {
            Some(p) => ("PAYTR_CALLBACK_PORT", Some(p)),
            None => ("PORT", get("PORT")),
        };
        let port = match port {
            Some(p) => p.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                var: port_var,
                reason: format!("{p:?} is not a valid port"),
            })?,
            None => DEFAULT_PORT,
        };

        let ledger = match get("PAYTR_LEDGER_PATH") {
            Some(p) if p.eq_ignore_ascii_case("memory") => LedgerBackend::Memory,
            Some(p) => LedgerBackend::Sqlite(p),
            None => LedgerBackend::Sqlite(DEFAULT_LEDGER_PATH.to_string()),
        };

        let claim_ttl_secs = parse_secs(&get, "PAYTR_CLAIM_TTL_SECS", DEFAULT_CLAIM_TTL_SECS)?;
        let ledger_retention_secs = parse_secs(
            &get,
            "PAYTR_LEDGER_RETENTION_SECS",
            DEFAULT_LEDGER_RETENTION_SECS,
        )?;

        let metrics_token = get("METRICS_TOKEN").map(String::into_bytes);

        let public_metrics = get("PAYTR_PUBLIC_METRICS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            merchant,
            port,
            ledger,
            claim_ttl_secs,
            ledger_retention_secs,
            metrics_token,
            public_metrics,
        })
    }
}

fn parse_secs<G>(get: &G, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(v) => v.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
            var,
            reason: format!("{v:?} is not a number of seconds"),
        }),
        None => Ok(default),
    }
}
