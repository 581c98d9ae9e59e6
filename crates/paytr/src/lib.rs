//! PayTR iFrame API integration.
//!
//! Covers the three merchant-side flows of the hosted checkout:
//!
//! - **Token requests** ([`PaytrClient::request_token`]): sign an order and
//!   exchange it for a short-lived iframe token
//! - **Callback verification** ([`CallbackVerifier`]): authenticate the
//!   server-to-server payment notification before acting on it
//! - **Status queries** ([`PaytrClient::query_status`]): look up settlement
//!   state and refunds of a past order
//!
//! plus refunds ([`PaytrClient::refund`]) and basket encoding.
//!
//! Every signature is `base64(HMAC_SHA256(merchant_key, message))` where the
//! message is a delimiter-free concatenation of fields and the merchant salt.
//! Each endpoint has its own field order; see the [`token`], [`callback`],
//! [`status`] and [`refund`] modules.
//!
//! # Quick example
//!
//! ```no_run
//! use paytr::{encode_basket, BasketItem, MerchantConfig, OrderRequest, PaytrClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MerchantConfig::from_env()?;
//! let client = PaytrClient::new(config.credentials.clone())?
//!     .with_endpoints(config.endpoints.clone());
//!
//! let (ok_url, fail_url) = config.redirect_urls()?;
//! let order = OrderRequest::builder("ORD1", "buyer@example.com", "999")
//!     .basket(encode_basket(&[BasketItem::new("Gift card", "9.99", 1)])?)
//!     .user_ip("203.0.113.7")
//!     .redirect_urls(ok_url, fail_url)
//!     .test_mode(config.test_mode)
//!     .build()?;
//!
//! let token = client.request_token(&order).await?;
//! println!("{}", token.iframe_url(client.endpoints()));
//! # Ok(())
//! # }
//! ```

pub mod basket;
pub mod callback;
pub mod client;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod hmac;
pub mod order;
pub mod refund;
pub mod security;
pub mod status;
pub mod token;

// Re-exports
pub use basket::{encode_basket, BasketItem};
pub use callback::{Acknowledgment, CallbackNotification, CallbackVerifier};
pub use client::PaytrClient;
pub use config::{ConfigError, MerchantConfig};
pub use constants::Endpoints;
pub use credentials::MerchantCredentials;
pub use error::PaytrError;
pub use order::{to_minor_units, Currency, Customer, Installments, OrderRequest};
pub use refund::{RefundReceipt, RefundRequest};
pub use status::{ReturnRecord, StatusReport};
pub use token::IframeToken;
