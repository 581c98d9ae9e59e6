use thiserror::Error;

/// Errors returned by PayTR API operations.
///
/// None of these are retried locally; each is surfaced to the caller as-is.
#[derive(Debug, Error)]
pub enum PaytrError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with a non-success HTTP status.
    #[error("http error {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Token request refused. Carries the raw response body verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Coded failure from the status or refund endpoint.
    #[error("{err_no} {err_msg}")]
    Vendor { err_no: String, err_msg: String },

    /// The response was not in the expected JSON shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request could not be built from the given input.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl From<reqwest::Error> for PaytrError {
    fn from(e: reqwest::Error) -> Self {
        PaytrError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_error_displays_code_and_message() {
        let err = PaytrError::Vendor {
            err_no: "9".to_string(),
            err_msg: "Not found".to_string(),
        };
        assert_eq!(err.to_string(), "9 Not found");
    }

    #[test]
    fn rejected_displays_body_verbatim() {
        let body = r#"{"status":"failed","reason":"paytr_token gecersiz"}"#;
        let err = PaytrError::Rejected(body.to_string());
        assert_eq!(err.to_string(), body);
    }
}
