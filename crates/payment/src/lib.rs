//! HTTP client for the external payment gateway.
//!
//! [`PaymentClient`] creates hosted checkout sessions; [`webhook`] verifies
//! the HMAC signature the gateway attaches to status callbacks.

pub mod client;
pub mod webhook;

pub use client::{CheckoutRequest, CheckoutSession, PaymentClient, PaymentConfig, PaymentError};
