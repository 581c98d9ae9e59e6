//! Refunds against a settled order (`/odeme/iade`).

use serde::Deserialize;

use crate::credentials::MerchantCredentials;
use crate::error::PaytrError;
use crate::hmac::compute_signature;
use crate::status::{lenient_string, parse_coded_response};

/// A full or partial refund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundRequest {
    pub merchant_oid: String,
    /// Major units with a dot separator, e.g. "11.97".
    pub return_amount: String,
    /// Optional merchant-side reference for this refund.
    pub reference_no: Option<String>,
}

impl RefundRequest {
    pub fn new(merchant_oid: impl Into<String>, return_amount: impl Into<String>) -> Self {
        Self {
            merchant_oid: merchant_oid.into(),
            return_amount: return_amount.into(),
            reference_no: None,
        }
    }

    pub fn with_reference(mut self, reference_no: impl Into<String>) -> Self {
        self.reference_no = Some(reference_no.into());
        self
    }
}

/// `base64(HMAC_SHA256(key, merchant_id + merchant_oid + return_amount + salt))`
pub fn sign_refund(credentials: &MerchantCredentials, request: &RefundRequest) -> String {
    compute_signature(
        credentials.key(),
        &[
            credentials.merchant_id().as_bytes(),
            request.merchant_oid.as_bytes(),
            request.return_amount.as_bytes(),
            credentials.salt(),
        ],
    )
}

pub fn refund_form(
    credentials: &MerchantCredentials,
    request: &RefundRequest,
) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("merchant_id", credentials.merchant_id().to_string()),
        ("merchant_oid", request.merchant_oid.clone()),
        ("return_amount", request.return_amount.clone()),
        ("paytr_token", sign_refund(credentials, request)),
    ];
    if let Some(reference) = &request.reference_no {
        form.push(("reference_no", reference.clone()));
    }
    form
}

/// Confirmation of an accepted refund.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefundReceipt {
    #[serde(default, deserialize_with = "lenient_string")]
    pub is_test: String,
    #[serde(deserialize_with = "lenient_string")]
    pub merchant_oid: String,
    #[serde(deserialize_with = "lenient_string")]
    pub return_amount: String,
}

impl RefundReceipt {
    pub fn is_test(&self) -> bool {
        self.is_test == "1"
    }
}

pub fn parse_refund_response(body: &str) -> Result<RefundReceipt, PaytrError> {
    parse_coded_response(body, "refund")
}
