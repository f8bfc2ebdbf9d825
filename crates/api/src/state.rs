use std::sync::Arc;

use verdex_events::{EmailDelivery, EventBus};
use verdex_payment::PaymentClient;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: verdex_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<EventBus>,
    /// Payment gateway client used by the order flow.
    pub payment: Arc<PaymentClient>,
    /// Outbound email, absent when SMTP is not configured.
    pub mailer: Option<Arc<EmailDelivery>>,
}
