//! HTTP client for the outbound PayTR endpoints.
//!
//! One form-encoded POST per call. Failures are returned to the caller
//! unchanged; there is no retry or backoff.

use std::time::Duration;

use crate::constants::{Endpoints, HTTP_TIMEOUT_SECS};
use crate::credentials::MerchantCredentials;
use crate::error::PaytrError;
use crate::order::OrderRequest;
use crate::refund::{parse_refund_response, refund_form, RefundReceipt, RefundRequest};
use crate::status::{parse_status_response, status_form, StatusReport};
use crate::token::{parse_token_response, token_form, IframeToken};

/// Build the shared `reqwest::Client` used for API calls.
pub fn build_http_client() -> Result<reqwest::Client, PaytrError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| PaytrError::Transport(format!("failed to build HTTP client: {e}")))
}

/// Signs and sends token, status and refund requests for one merchant.
#[derive(Debug, Clone)]
pub struct PaytrClient {
    http: reqwest::Client,
    credentials: MerchantCredentials,
    endpoints: Endpoints,
}

impl PaytrClient {
    pub fn new(credentials: MerchantCredentials) -> Result<Self, PaytrError> {
        Ok(Self {
            http: build_http_client()?,
            credentials,
            endpoints: Endpoints::default(),
        })
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn merchant_id(&self) -> &str {
        self.credentials.merchant_id()
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<String, PaytrError> {
        let resp = self
            .http
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| PaytrError::Transport(format!("request to {url} failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PaytrError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(PaytrError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// Exchange a signed order for an iframe token.
    pub async fn request_token(&self, order: &OrderRequest) -> Result<IframeToken, PaytrError> {
        let form = token_form(&self.credentials, order);
        tracing::debug!(
            merchant_oid = %order.merchant_oid,
            amount = %order.payment_amount,
            currency = %order.currency,
            test_mode = order.test_mode,
            "requesting iframe token"
        );

        let body = self.post_form(&self.endpoints.token_url(), &form).await?;
        match parse_token_response(&body) {
            Ok(token) => {
                tracing::info!(merchant_oid = %order.merchant_oid, "iframe token issued");
                Ok(token)
            }
            Err(e) => {
                tracing::warn!(merchant_oid = %order.merchant_oid, error = %e, "token request failed");
                Err(e)
            }
        }
    }

    /// Look up the settlement state of a previous order.
    pub async fn query_status(&self, merchant_oid: &str) -> Result<StatusReport, PaytrError> {
        let form = status_form(&self.credentials, merchant_oid);
        tracing::debug!(merchant_oid = %merchant_oid, "querying order status");

        let body = self.post_form(&self.endpoints.status_url(), &form).await?;
        let report = parse_status_response(&body)?;
        tracing::info!(
            merchant_oid = %merchant_oid,
            returns = report.returns.len(),
            "order status retrieved"
        );
        Ok(report)
    }

    /// Request a full or partial refund.
    pub async fn refund(&self, request: &RefundRequest) -> Result<RefundReceipt, PaytrError> {
        let form = refund_form(&self.credentials, request);
        tracing::debug!(
            merchant_oid = %request.merchant_oid,
            amount = %request.return_amount,
            "requesting refund"
        );

        let body = self.post_form(&self.endpoints.refund_url(), &form).await?;
        let receipt = parse_refund_response(&body)?;
        tracing::info!(
            merchant_oid = %receipt.merchant_oid,
            amount = %receipt.return_amount,
            test = receipt.is_test(),
            "refund accepted"
        );
        Ok(receipt)
    }
}
