/// Production API host.
pub const API_BASE: &str = "https://www.paytr.com";

/// iFrame token issuance endpoint.
pub const TOKEN_PATH: &str = "/odeme/api/get-token";

/// Order status query endpoint.
pub const STATUS_PATH: &str = "/odeme/durum-sorgu";

/// Refund endpoint.
pub const REFUND_PATH: &str = "/odeme/iade";

/// Hosted payment page; the iframe token is appended to this path.
pub const IFRAME_PATH: &str = "/odeme/guvenli/";

/// Callback reply for a verified notification. The vendor keeps redelivering
/// until it reads exactly this body.
pub const ACK_OK: &str = "OK";

/// Callback reply when the notification hash does not match.
pub const ACK_BAD_HASH: &str = "PAYTR notification failed: bad hash";

/// Callback reply for anything that is not a POST.
pub const ACK_IGNORED: &str = "";

/// Minutes the hosted page stays valid when the caller does not say otherwise.
pub const DEFAULT_TIMEOUT_LIMIT: u32 = 30;

/// Interface language of the hosted page.
pub const DEFAULT_LANGUAGE: &str = "tr";

/// Request timeout for outbound API calls, matching the vendor samples.
pub const HTTP_TIMEOUT_SECS: u64 = 90;

/// Runtime endpoint configuration. Lets tests and staging point the client at
/// another host while keeping the vendor's path layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub base_url: String,
}

impl Endpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}{TOKEN_PATH}", self.base_url)
    }

    pub fn status_url(&self) -> String {
        format!("{}{STATUS_PATH}", self.base_url)
    }

    pub fn refund_url(&self) -> String {
        format!("{}{REFUND_PATH}", self.base_url)
    }

    pub fn iframe_url(&self, token: &str) -> String {
        format!("{}{IFRAME_PATH}{token}", self.base_url)
    }
}

impl Default for Endpoints {
    /// Defaults to the production host.
    fn default() -> Self {
        Self::new(API_BASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints_point_at_production() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.token_url(),
            "https://www.paytr.com/odeme/api/get-token"
        );
        assert_eq!(
            endpoints.status_url(),
            "https://www.paytr.com/odeme/durum-sorgu"
        );
        assert_eq!(endpoints.refund_url(), "https://www.paytr.com/odeme/iade");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let endpoints = Endpoints::new("http://127.0.0.1:8080/");
        assert_eq!(
            endpoints.iframe_url("abc"),
            "http://127.0.0.1:8080/odeme/guvenli/abc"
        );
    }
}
