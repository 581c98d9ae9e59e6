use std::env;

use url::Url;

use crate::constants::{Endpoints, API_BASE, DEFAULT_LANGUAGE};
use crate::credentials::MerchantCredentials;
use crate::order::Currency;

/// Merchant settings shared by the CLI and the callback server.
#[derive(Debug, Clone)]
pub struct MerchantConfig {
    pub credentials: MerchantCredentials,
    /// Landing page after a successful payment (token requests only)
    pub ok_url: Option<String>,
    /// Landing page after a failed payment (token requests only)
    pub fail_url: Option<String>,
    pub test_mode: bool,
    pub currency: Currency,
    pub language: String,
    pub endpoints: Endpoints,
}

impl MerchantConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source. `from_env` is this with the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        // Required: credentials
        let merchant_id =
            get("PAYTR_MERCHANT_ID").ok_or(ConfigError::MissingRequired("PAYTR_MERCHANT_ID"))?;
        let key =
            get("PAYTR_MERCHANT_KEY").ok_or(ConfigError::MissingRequired("PAYTR_MERCHANT_KEY"))?;
        let salt = get("PAYTR_MERCHANT_SALT")
            .ok_or(ConfigError::MissingRequired("PAYTR_MERCHANT_SALT"))?;

        // Optional: landing pages, validated when present
        let ok_url = get("PAYTR_MERCHANT_OK_URL")
            .map(|u| validate_url("PAYTR_MERCHANT_OK_URL", u))
            .transpose()?;
        let fail_url = get("PAYTR_MERCHANT_FAIL_URL")
            .map(|u| validate_url("PAYTR_MERCHANT_FAIL_URL", u))
            .transpose()?;

        let test_mode = get("PAYTR_TEST_MODE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let currency = match get("PAYTR_CURRENCY") {
            Some(c) => c.parse::<Currency>().map_err(|_| ConfigError::Invalid {
                var: "PAYTR_CURRENCY",
                reason: format!("unsupported currency {c:?}"),
            })?,
            None => Currency::default(),
        };

        let language = get("PAYTR_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let base = get("PAYTR_API_BASE").unwrap_or_else(|| API_BASE.to_string());
        let base = validate_url("PAYTR_API_BASE", base)?;
        if !base.starts_with("https://") {
            tracing::warn!(
                base = %base,
                "PAYTR_API_BASE is not HTTPS; only use this against a local test server"
            );
        }

        Ok(Self {
            credentials: MerchantCredentials::new(merchant_id, key, salt),
            ok_url,
            fail_url,
            test_mode,
            currency,
            language,
            endpoints: Endpoints::new(base),
        })
    }

    /// Both landing pages, or an error naming the first one missing.
    pub fn redirect_urls(&self) -> Result<(&str, &str), ConfigError> {
        let ok = self
            .ok_url
            .as_deref()
            .ok_or(ConfigError::MissingRequired("PAYTR_MERCHANT_OK_URL"))?;
        let fail = self
            .fail_url
            .as_deref()
            .ok_or(ConfigError::MissingRequired("PAYTR_MERCHANT_FAIL_URL"))?;
        Ok((ok, fail))
    }
}

fn validate_url(var: &'static str, value: String) -> Result<String, ConfigError> {
    Url::parse(&value).map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("{value:?} is not a valid URL: {e}"),
    })?;
    Ok(value)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
