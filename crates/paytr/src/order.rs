//! Order model for iFrame token requests.
//!
//! An [`OrderRequest`] is assembled once per checkout attempt through
//! [`OrderRequestBuilder`] and is not modified after signing.

use std::fmt;
use std::str::FromStr;

use crate::constants::{DEFAULT_LANGUAGE, DEFAULT_TIMEOUT_LIMIT};
use crate::error::PaytrError;

/// Currencies accepted by the hosted page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Currency {
    #[default]
    TL,
    EUR,
    USD,
    GBP,
    RUB,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::TL => "TL",
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::GBP => "GBP",
            Currency::RUB => "RUB",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = PaytrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TL" | "TRY" => Ok(Currency::TL),
            "EUR" => Ok(Currency::EUR),
            "USD" => Ok(Currency::USD),
            "GBP" => Ok(Currency::GBP),
            "RUB" => Ok(Currency::RUB),
            other => Err(PaytrError::InvalidRequest(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

/// Installment constraints shown on the hosted page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Installments {
    /// Single payment only, no installment options.
    pub no_installment: bool,
    /// Upper bound on offered installments; `0` leaves it to the vendor.
    pub max_installment: u8,
}

pub const MAX_INSTALLMENT_LIMIT: u8 = 12;

/// Optional customer contact details forwarded to the hosted page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// A signed-once checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub merchant_oid: String,
    pub email: String,
    /// Integer minor units ("999" = 9.99 TL).
    pub payment_amount: String,
    /// Base64 of a JSON array of `[name, unit_price, qty]`. Not validated here.
    pub user_basket: String,
    pub currency: Currency,
    pub installments: Installments,
    pub customer: Customer,
    /// Must be the buyer's externally routable address.
    pub user_ip: String,
    pub merchant_ok_url: String,
    pub merchant_fail_url: String,
    /// Minutes.
    pub timeout_limit: u32,
    pub debug_on: bool,
    pub test_mode: bool,
    pub lang: String,
}

impl OrderRequest {
    pub fn builder(
        merchant_oid: impl Into<String>,
        email: impl Into<String>,
        payment_amount: impl Into<String>,
    ) -> OrderRequestBuilder {
        OrderRequestBuilder::new(merchant_oid, email, payment_amount)
    }
}

/// Builder for [`OrderRequest`]. `build()` checks the fields the vendor would
/// otherwise reject without a usable reason.
#[derive(Debug, Clone)]
pub struct OrderRequestBuilder {
    merchant_oid: String,
    email: String,
    payment_amount: String,
    user_basket: String,
    currency: Currency,
    installments: Installments,
    customer: Customer,
    user_ip: String,
    merchant_ok_url: String,
    merchant_fail_url: String,
    timeout_limit: u32,
    debug_on: bool,
    test_mode: bool,
    lang: String,
}

impl OrderRequestBuilder {
    pub fn new(
        merchant_oid: impl Into<String>,
        email: impl Into<String>,
        payment_amount: impl Into<String>,
    ) -> Self {
        Self {
            merchant_oid: merchant_oid.into(),
            email: email.into(),
            payment_amount: payment_amount.into(),
            user_basket: String::new(),
            currency: Currency::default(),
            installments: Installments::default(),
            customer: Customer::default(),
            user_ip: String::new(),
            merchant_ok_url: String::new(),
            merchant_fail_url: String::new(),
            timeout_limit: DEFAULT_TIMEOUT_LIMIT,
            debug_on: true,
            test_mode: false,
            lang: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn basket(mut self, user_basket: impl Into<String>) -> Self {
        self.user_basket = user_basket.into();
        self
    }

    pub fn user_ip(mut self, user_ip: impl Into<String>) -> Self {
        self.user_ip = user_ip.into();
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn installments(mut self, installments: Installments) -> Self {
        self.installments = installments;
        self
    }

    pub fn customer(mut self, customer: Customer) -> Self {
        self.customer = customer;
        self
    }

    /// Success and failure landing pages. `merchant_oid` is appended to both
    /// as a query parameter so the landing page can look the order up.
    pub fn redirect_urls(mut self, ok_url: impl Into<String>, fail_url: impl Into<String>) -> Self {
        self.merchant_ok_url = ok_url.into();
        self.merchant_fail_url = fail_url.into();
        self
    }

    pub fn timeout_limit(mut self, minutes: u32) -> Self {
        self.timeout_limit = minutes;
        self
    }

    pub fn debug_on(mut self, debug_on: bool) -> Self {
        self.debug_on = debug_on;
        self
    }

    pub fn test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn build(self) -> Result<OrderRequest, PaytrError> {
        if self.merchant_oid.is_empty()
            || !self.merchant_oid.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(PaytrError::InvalidRequest(format!(
                "merchant_oid must be non-empty and alphanumeric: {:?}",
                self.merchant_oid
            )));
        }
        if self.email.trim().is_empty() {
            return Err(PaytrError::InvalidRequest("email is required".to_string()));
        }
        if self.payment_amount.is_empty() || !self.payment_amount.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(PaytrError::InvalidRequest(format!(
                "payment_amount must be integer minor units: {:?}",
                self.payment_amount
            )));
        }
        if self.user_basket.is_empty() {
            return Err(PaytrError::InvalidRequest("user_basket is required".to_string()));
        }
        if self.user_ip.is_empty() {
            return Err(PaytrError::InvalidRequest("user_ip is required".to_string()));
        }
        if self.installments.max_installment > MAX_INSTALLMENT_LIMIT {
            return Err(PaytrError::InvalidRequest(format!(
                "max_installment must be at most {MAX_INSTALLMENT_LIMIT}"
            )));
        }

        let merchant_ok_url = with_order_id(&self.merchant_ok_url, &self.merchant_oid)?;
        let merchant_fail_url = with_order_id(&self.merchant_fail_url, &self.merchant_oid)?;

        Ok(OrderRequest {
            merchant_oid: self.merchant_oid,
            email: self.email,
            payment_amount: self.payment_amount,
            user_basket: self.user_basket,
            currency: self.currency,
            installments: self.installments,
            customer: self.customer,
            user_ip: self.user_ip,
            merchant_ok_url,
            merchant_fail_url,
            timeout_limit: self.timeout_limit,
            debug_on: self.debug_on,
            test_mode: self.test_mode,
            lang: self.lang,
        })
    }
}

fn with_order_id(landing_url: &str, merchant_oid: &str) -> Result<String, PaytrError> {
    url::Url::parse(landing_url)
        .map_err(|e| PaytrError::InvalidRequest(format!("invalid redirect URL {landing_url:?}: {e}")))?;
    let sep = if landing_url.contains('?') { '&' } else { '?' };
    Ok(format!(
        "{landing_url}{sep}merchant_oid={}",
        urlencoding::encode(merchant_oid)
    ))
}

/// Convert a major-unit decimal amount ("12.34") to the integer minor-units
/// string the API expects ("1234"). At most two fraction digits.
pub fn to_minor_units(amount: &str) -> Result<String, PaytrError> {
    let invalid = || PaytrError::InvalidRequest(format!("invalid amount: {amount:?}"));

    let (whole, fraction) = match amount.trim().split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount.trim(), ""),
    };
    if whole.is_empty()
        || fraction.len() > 2
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: u64 = whole.parse().map_err(|_| invalid())?;
    let cents: u64 = format!("{fraction:0<2}").parse().map_err(|_| invalid())?;
    let minor = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(cents))
        .ok_or_else(invalid)?;
    Ok(minor.to_string())
}
