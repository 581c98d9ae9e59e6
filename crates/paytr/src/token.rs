//! iFrame token requests.
//!
//! The `paytr_token` is `base64(HMAC_SHA256(key, fields || salt))` where
//! `fields` is a delimiter-free concatenation in a fixed order:
//!
//! ```text
//! merchant_id user_ip merchant_oid email payment_amount user_basket
//! no_installment max_installment currency test_mode
//! ```
//!
//! The order and the absence of separators are part of the wire contract;
//! the vendor recomputes the same string byte for byte.

use serde::Deserialize;

use crate::constants::Endpoints;
use crate::credentials::MerchantCredentials;
use crate::error::PaytrError;
use crate::hmac::compute_signature;
use crate::order::OrderRequest;

pub(crate) fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// The message signed for a token request, without the salt.
pub fn token_signing_string(merchant_id: &str, order: &OrderRequest) -> String {
    let max_installment = order.installments.max_installment.to_string();
    [
        merchant_id,
        order.user_ip.as_str(),
        order.merchant_oid.as_str(),
        order.email.as_str(),
        order.payment_amount.as_str(),
        order.user_basket.as_str(),
        flag(order.installments.no_installment),
        max_installment.as_str(),
        order.currency.as_str(),
        flag(order.test_mode),
    ]
    .concat()
}

/// Compute the `paytr_token` for an order.
pub fn sign_token_request(credentials: &MerchantCredentials, order: &OrderRequest) -> String {
    let message = token_signing_string(credentials.merchant_id(), order);
    compute_signature(credentials.key(), &[message.as_bytes(), credentials.salt()])
}

/// Form fields posted to the token endpoint, signature included.
/// Merchant key and salt are not included.
pub fn token_form(
    credentials: &MerchantCredentials,
    order: &OrderRequest,
) -> Vec<(&'static str, String)> {
    vec![
        ("merchant_id", credentials.merchant_id().to_string()),
        ("user_ip", order.user_ip.clone()),
        ("merchant_oid", order.merchant_oid.clone()),
        ("email", order.email.clone()),
        ("payment_amount", order.payment_amount.clone()),
        ("paytr_token", sign_token_request(credentials, order)),
        ("user_basket", order.user_basket.clone()),
        ("debug_on", flag(order.debug_on).to_string()),
        ("no_installment", flag(order.installments.no_installment).to_string()),
        ("max_installment", order.installments.max_installment.to_string()),
        ("user_name", order.customer.name.clone()),
        ("user_address", order.customer.address.clone()),
        ("user_phone", order.customer.phone.clone()),
        ("merchant_ok_url", order.merchant_ok_url.clone()),
        ("merchant_fail_url", order.merchant_fail_url.clone()),
        ("timeout_limit", order.timeout_limit.to_string()),
        ("currency", order.currency.as_str().to_string()),
        ("test_mode", flag(order.test_mode).to_string()),
        ("lang", order.lang.clone()),
    ]
}

/// Short-lived, single-use token for the hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IframeToken(String);

impl IframeToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `src` for the payment iframe.
    pub fn iframe_url(&self, endpoints: &Endpoints) -> String {
        endpoints.iframe_url(&self.0)
    }
}

impl std::fmt::Display for IframeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    status: String,
    #[serde(default)]
    token: Option<String>,
}

/// Interpret a token endpoint response body.
///
/// `status == "success"` yields the token. Any other status is a rejection
/// whose message is the response body exactly as received.
pub fn parse_token_response(body: &str) -> Result<IframeToken, PaytrError> {
    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|e| PaytrError::MalformedResponse(format!("token response: {e}")))?;

    if parsed.status != "success" {
        return Err(PaytrError::Rejected(body.to_string()));
    }

    match parsed.token {
        Some(token) if !token.is_empty() => Ok(IframeToken(token)),
        _ => Err(PaytrError::MalformedResponse(
            "token response reported success without a token".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{Currency, Installments};

    const KEY: &[u8] = b"test-merchant-key";
    const SALT: &[u8] = b"test-merchant-salt";

    fn credentials() -> MerchantCredentials {
        MerchantCredentials::new("M1", KEY, SALT)
    }

    fn order() -> OrderRequest {
        OrderRequest::builder("ORD1", "a@b.com", "999")
            .basket("W10=")
            .user_ip("1.2.3.4")
            .currency(Currency::TL)
            .test_mode(true)
            .redirect_urls("https://shop.example/ok", "https://shop.example/fail")
            .build()
            .unwrap()
    }

    #[test]
    fn signing_string_follows_vendor_order() {
        assert_eq!(
            token_signing_string("M1", &order()),
            "M11.2.3.4ORD1a@b.com999W10=00TL1"
        );
    }

    #[test]
    fn signature_matches_pinned_vector() {
        assert_eq!(
            sign_token_request(&credentials(), &order()),
            "+gXbpwhRrwmIQH5xvUopm+2mHbUqtxKOZK6athRYi1E="
        );
    }

    #[test]
    fn salt_is_appended_not_used_as_key() {
        let message = token_signing_string("M1", &order());
        let mut with_salt = message.into_bytes();
        with_salt.extend_from_slice(SALT);
        assert_eq!(
            sign_token_request(&credentials(), &order()),
            compute_signature(KEY, &[with_salt.as_slice()])
        );
    }

    #[test]
    fn every_field_changes_the_signature() {
        let base = sign_token_request(&credentials(), &order());

        let mut variants = Vec::new();
        let mut o = order();
        o.user_ip = "1.2.3.5".into();
        variants.push(o);
        let mut o = order();
        o.merchant_oid = "ORD2".into();
        variants.push(o);
        let mut o = order();
        o.email = "b@b.com".into();
        variants.push(o);
        let mut o = order();
        o.payment_amount = "998".into();
        variants.push(o);
        let mut o = order();
        o.user_basket = "W1tdXQ==".into();
        variants.push(o);
        let mut o = order();
        o.installments.no_installment = true;
        variants.push(o);
        let mut o = order();
        o.installments.max_installment = 6;
        variants.push(o);
        let mut o = order();
        o.currency = Currency::USD;
        variants.push(o);
        let mut o = order();
        o.test_mode = false;
        variants.push(o);

        for variant in &variants {
            assert_ne!(sign_token_request(&credentials(), variant), base);
        }

        let other_merchant = MerchantCredentials::new("M2", KEY, SALT);
        assert_ne!(sign_token_request(&other_merchant, &order()), base);
    }

    #[test]
    fn fixed_width_flags_keep_installment_fields_apart() {
        // no_installment is always one character, so "0"+"10" and "1"+"0"
        // cannot produce the same string.
        let mut a = order();
        a.installments = Installments {
            no_installment: false,
            max_installment: 10,
        };
        let mut b = order();
        b.installments = Installments {
            no_installment: true,
            max_installment: 0,
        };
        assert_ne!(
            token_signing_string("M1", &a),
            token_signing_string("M1", &b)
        );
        assert_ne!(
            sign_token_request(&credentials(), &a),
            sign_token_request(&credentials(), &b)
        );

    }

    #[test]
    fn variable_width_neighbours_are_joined_without_delimiter() {
        // Known property of the vendor scheme: moving a character across the
        // merchant_oid/email boundary yields the same signing string. The
        // byte layout must stay this way to verify against the API.
        let mut c = order();
        c.merchant_oid = "ORD12".into();
        c.email = "3a@b.com".into();
        let mut d = order();
        d.merchant_oid = "ORD123".into();
        d.email = "a@b.com".into();
        assert_eq!(
            token_signing_string("M1", &c),
            token_signing_string("M1", &d)
        );

        // Changing the digit itself always changes the signature.
        let mut e = order();
        e.merchant_oid = "ORD124".into();
        e.email = "a@b.com".into();
        assert_ne!(
            sign_token_request(&credentials(), &d),
            sign_token_request(&credentials(), &e)
        );

        // Amounts that differ only in length.
        let mut f = order();
        f.payment_amount = "9990".into();
        let mut g = order();
        g.payment_amount = "99".into();
        assert_ne!(
            sign_token_request(&credentials(), &f),
            sign_token_request(&credentials(), &g)
        );
    }

    #[test]
    fn form_contains_token_and_no_secrets() {
        let form = token_form(&credentials(), &order());
        let get = |name: &str| {
            form.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(
            get("paytr_token"),
            Some("+gXbpwhRrwmIQH5xvUopm+2mHbUqtxKOZK6athRYi1E=")
        );
        assert_eq!(get("timeout_limit"), Some("30"));
        assert_eq!(get("lang"), Some("tr"));
        assert_eq!(get("merchant_ok_url"), Some("https://shop.example/ok?merchant_oid=ORD1"));
        assert!(get("merchant_key").is_none());
        assert!(get("merchant_salt").is_none());
    }

    #[test]
    fn parse_success_response() {
        let token = parse_token_response(r#"{"status":"success","token":"abc123"}"#).unwrap();
        assert_eq!(token.as_str(), "abc123");
        assert_eq!(
            token.iframe_url(&Endpoints::default()),
            "https://www.paytr.com/odeme/guvenli/abc123"
        );
    }

    #[test]
    fn parse_failed_response_keeps_body() {
        let body = r#"{"status":"failed","reason":"user_ip gecersiz"}"#;
        match parse_token_response(body) {
            Err(PaytrError::Rejected(text)) => assert_eq!(text, body),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn parse_non_json_is_malformed() {
        assert!(matches!(
            parse_token_response("<html>502</html>"),
            Err(PaytrError::MalformedResponse(_))
        ));
    }

    #[test]
    fn parse_success_without_token_is_malformed() {
        assert!(matches!(
            parse_token_response(r#"{"status":"success"}"#),
            Err(PaytrError::MalformedResponse(_))
        ));
    }
}
