use std::sync::Arc;

use paytr::CallbackVerifier;

use crate::handler::PaymentEventHandler;
use crate::ledger::NotificationLedger;

/// Shared application state for the callback server.
pub struct AppState {
    pub verifier: CallbackVerifier,
    pub ledger: Arc<dyn NotificationLedger>,
    pub handler: Arc<dyn PaymentEventHandler>,
    /// Bearer token for /metrics (None = governed by `public_metrics`).
    pub metrics_token: Option<Vec<u8>>,
    /// Serve /metrics without a token when none is configured.
    pub public_metrics: bool,
}
