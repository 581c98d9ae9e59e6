//! Order status queries (`/odeme/durum-sorgu`).

use serde::{Deserialize, Deserializer};

use crate::credentials::MerchantCredentials;
use crate::error::PaytrError;
use crate::hmac::compute_signature;

/// `base64(HMAC_SHA256(key, merchant_id + merchant_oid + salt))`
pub fn sign_status_query(credentials: &MerchantCredentials, merchant_oid: &str) -> String {
    compute_signature(
        credentials.key(),
        &[
            credentials.merchant_id().as_bytes(),
            merchant_oid.as_bytes(),
            credentials.salt(),
        ],
    )
}

pub fn status_form(
    credentials: &MerchantCredentials,
    merchant_oid: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("merchant_id", credentials.merchant_id().to_string()),
        ("merchant_oid", merchant_oid.to_string()),
        ("paytr_token", sign_status_query(credentials, merchant_oid)),
    ]
}

/// Accepts a JSON string, number or null and yields its text form.
/// The API is not consistent about quoting numeric fields.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// A return or refund recorded against the order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReturnRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub return_amount: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub return_date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub return_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reference_no: String,
    /// Fields this crate does not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Settlement state of a successful query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusReport {
    #[serde(deserialize_with = "lenient_string")]
    pub payment_amount: String,
    #[serde(deserialize_with = "lenient_string")]
    pub payment_total: String,
    #[serde(deserialize_with = "lenient_string")]
    pub currency: String,
    #[serde(default)]
    pub returns: Vec<ReturnRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VendorFailure {
    #[serde(deserialize_with = "lenient_string")]
    pub err_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub err_msg: String,
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    status: String,
}

/// Split a status/refund style body into the success payload or a coded
/// vendor error.
pub(crate) fn parse_coded_response<T>(body: &str, what: &str) -> Result<T, PaytrError>
where
    T: serde::de::DeserializeOwned,
{
    let envelope: StatusEnvelope = serde_json::from_str(body)
        .map_err(|e| PaytrError::MalformedResponse(format!("{what} response: {e}")))?;

    if envelope.status != "success" {
        let failure: VendorFailure = serde_json::from_str(body)
            .map_err(|e| PaytrError::MalformedResponse(format!("{what} error response: {e}")))?;
        return Err(PaytrError::Vendor {
            err_no: failure.err_no,
            err_msg: failure.err_msg,
        });
    }

    serde_json::from_str(body)
        .map_err(|e| PaytrError::MalformedResponse(format!("{what} response: {e}")))
}

/// Interpret a status query response body.
pub fn parse_status_response(body: &str) -> Result<StatusReport, PaytrError> {
    parse_coded_response(body, "status")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> MerchantCredentials {
        MerchantCredentials::new("M1", "test-merchant-key", "test-merchant-salt")
    }

    #[test]
    fn signature_matches_pinned_vector() {
        assert_eq!(
            sign_status_query(&credentials(), "ORD1"),
            "W60CRQ9zkqfVOv8oYQM1wGoUKVCybLYXWWmJ3u5G9Kk="
        );
    }

    #[test]
    fn signature_is_merchant_then_oid_then_salt() {
        let expected = compute_signature(
            b"test-merchant-key",
            &[b"M1ORD1test-merchant-salt".as_slice()],
        );
        assert_eq!(sign_status_query(&credentials(), "ORD1"), expected);
    }

    #[test]
    fn form_carries_three_fields() {
        let form = status_form(&credentials(), "ORD1");
        let names: Vec<_> = form.iter().map(|(k, _)| *k).collect();
        assert_eq!(names, ["merchant_id", "merchant_oid", "paytr_token"]);
    }

    #[test]
    fn vendor_failure_surfaces_code_and_message() {
        let err = parse_status_response(r#"{"status":"failed","err_no":"9","err_msg":"Not found"}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "9 Not found");
    }

    #[test]
    fn numeric_error_code_is_accepted() {
        let err = parse_status_response(r#"{"status":"error","err_no":9,"err_msg":"Not found"}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "9 Not found");
    }

    #[test]
    fn failure_without_error_code_is_malformed() {
        for body in [
            r#"{"status":"failed"}"#,
            r#"{"status":"failed","reason":"merchant_oid gecersiz"}"#,
            r#"{"status":"failed","err_msg":"Not found"}"#,
        ] {
            let err = parse_status_response(body).unwrap_err();
            assert!(
                matches!(err, PaytrError::MalformedResponse(_)),
                "{body} gave {err:?}"
            );
        }
    }

    #[test]
    fn success_with_returns() {
        let body = r#"{
            "status": "success",
            "payment_amount": "100.00",
            "payment_total": "103.50",
            "currency": "TL",
            "returns": [
                {"return_amount": "10.00", "return_date": "2024-01-02 10:00:00",
                 "return_type": "iade", "reference_no": "R1", "is_test": 1}
            ]
        }"#;
        let report = parse_status_response(body).unwrap();
        assert_eq!(report.payment_amount, "100.00");
        assert_eq!(report.payment_total, "103.50");
        assert_eq!(report.currency, "TL");
        assert_eq!(report.returns.len(), 1);
        assert_eq!(report.returns[0].return_amount, "10.00");
        assert_eq!(report.returns[0].extra["is_test"], 1);
    }

    #[test]
    fn success_without_returns_defaults_to_empty() {
        let body = r#"{"status":"success","payment_amount":100,"payment_total":100,"currency":"TL"}"#;
        let report = parse_status_response(body).unwrap();
        assert_eq!(report.payment_amount, "100");
        assert!(report.returns.is_empty());
    }

    #[test]
    fn unexpected_shape_is_malformed() {
        assert!(matches!(
            parse_status_response(r#"{"status":"success"}"#),
            Err(PaytrError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_status_response("not json"),
            Err(PaytrError::MalformedResponse(_))
        ));
    }
}
