//! HTTP endpoint for PayTR payment notifications.
//!
//! Verifies the notification hash, records the order in a
//! [`ledger::NotificationLedger`] so redeliveries do not repeat side effects,
//! and hands the outcome to a [`handler::PaymentEventHandler`].

pub mod config;
pub mod handler;
pub mod ledger;
pub mod metrics;
pub mod routes;
pub mod state;
