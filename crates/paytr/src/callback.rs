//! Server-to-server payment notifications.
//!
//! PayTR POSTs the outcome of each payment to the merchant's callback URL.
//! The `hash` field is `base64(HMAC_SHA256(key, merchant_oid + salt + status
//! + total_amount))`; note the salt sits in the middle here, unlike the
//! request signatures. The hash is the only authentication on this channel.
//!
//! The vendor redelivers a notification until it reads the literal body
//! `OK`, so whatever runs after verification must tolerate repeats.

use serde::{Deserialize, Serialize};

use crate::constants::{ACK_BAD_HASH, ACK_IGNORED, ACK_OK};
use crate::credentials::MerchantCredentials;
use crate::hmac::{compute_signature, verify_signature};

/// Form body of a payment notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackNotification {
    pub merchant_oid: String,
    /// Signed verbatim; `"success"` or `"failed"` in practice.
    pub status: String,
    pub total_amount: String,
    pub hash: String,
    #[serde(default)]
    pub failed_reason_code: Option<String>,
    #[serde(default)]
    pub failed_reason_msg: Option<String>,
    #[serde(default)]
    pub test_mode: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_amount: Option<String>,
}

impl CallbackNotification {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Human-readable reason for a failed payment.
    pub fn failure_message(&self) -> String {
        let msg = self.failed_reason_msg.as_deref().filter(|m| !m.is_empty());
        let code = self.failed_reason_code.as_deref().filter(|c| !c.is_empty());
        match (msg, code) {
            (Some(msg), _) => msg.to_string(),
            (None, Some(code)) => format!("payment failed with code: {code}"),
            (None, None) => "payment failed for unknown reason".to_string(),
        }
    }
}

/// Reply bodies understood by the vendor's delivery poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgment {
    /// Not a POST; nothing was read.
    Ignored,
    /// Hash mismatch; no business action taken.
    BadHash,
    /// Verified and handled.
    Ok,
}

impl Acknowledgment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Acknowledgment::Ignored => ACK_IGNORED,
            Acknowledgment::BadHash => ACK_BAD_HASH,
            Acknowledgment::Ok => ACK_OK,
        }
    }
}

impl std::fmt::Display for Acknowledgment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recomputes and checks notification hashes.
#[derive(Debug, Clone)]
pub struct CallbackVerifier {
    credentials: MerchantCredentials,
}

impl CallbackVerifier {
    pub fn new(credentials: MerchantCredentials) -> Self {
        Self { credentials }
    }

    pub fn merchant_id(&self) -> &str {
        self.credentials.merchant_id()
    }

    /// The hash the vendor is expected to send for these fields.
    pub fn expected_hash(&self, merchant_oid: &str, status: &str, total_amount: &str) -> String {
        compute_signature(
            self.credentials.key(),
            &[
                merchant_oid.as_bytes(),
                self.credentials.salt(),
                status.as_bytes(),
                total_amount.as_bytes(),
            ],
        )
    }

    /// Constant-time check of a supplied hash.
    pub fn verify(&self, merchant_oid: &str, status: &str, total_amount: &str, hash: &str) -> bool {
        verify_signature(
            self.credentials.key(),
            &[
                merchant_oid.as_bytes(),
                self.credentials.salt(),
                status.as_bytes(),
                total_amount.as_bytes(),
            ],
            hash,
        )
    }

    pub fn verify_notification(&self, notification: &CallbackNotification) -> bool {
        self.verify(
            &notification.merchant_oid,
            &notification.status,
            &notification.total_amount,
            &notification.hash,
        )
    }

    /// Authentication step of the callback flow: which reply to send before
    /// any business logic runs. `Ok` means the caller may act on the
    /// notification.
    pub fn acknowledge(
        &self,
        is_post: bool,
        notification: Option<&CallbackNotification>,
    ) -> Acknowledgment {
        if !is_post {
            return Acknowledgment::Ignored;
        }
        match notification {
            Some(n) if self.verify_notification(n) => Acknowledgment::Ok,
            _ => Acknowledgment::BadHash,
        }
    }
}
