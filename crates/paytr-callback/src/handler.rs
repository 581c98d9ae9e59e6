use async_trait::async_trait;
use paytr::CallbackNotification;

/// Failure inside merchant business logic. The notification is answered with
/// a non-`OK` body so the vendor delivers it again.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Merchant business logic run after a notification has been authenticated.
///
/// Called at most once per `merchant_oid` while the ledger holds the claim;
/// a returned error releases the claim.
#[async_trait]
pub trait PaymentEventHandler: Send + Sync {
    /// `status == "success"`: mark the order paid, fulfil it.
    async fn on_success(&self, notification: &CallbackNotification) -> Result<(), HandlerError>;

    /// Any other status: mark the order failed.
    async fn on_failure(&self, notification: &CallbackNotification) -> Result<(), HandlerError>;
}

/// Handler that only records outcomes in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

#[async_trait]
impl PaymentEventHandler for LoggingHandler {
    async fn on_success(&self, notification: &CallbackNotification) -> Result<(), HandlerError> {
        tracing::info!(
            merchant_oid = %notification.merchant_oid,
            total_amount = %notification.total_amount,
            payment_type = notification.payment_type.as_deref().unwrap_or("unknown"),
            test_mode = notification.test_mode.as_deref().unwrap_or("0"),
            "payment succeeded"
        );
        Ok(())
    }

    async fn on_failure(&self, notification: &CallbackNotification) -> Result<(), HandlerError> {
        tracing::info!(
            merchant_oid = %notification.merchant_oid,
            reason = %notification.failure_message(),
            "payment failed"
        );
        Ok(())
    }
}
