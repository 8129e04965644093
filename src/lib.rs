//! IT Desk: the IT-account admin backend and the pending-setup dashboard.
//!
//! Employee lifecycle events queue [`models::Notification`]s in a local
//! [`services::NotificationStore`]; the [`services::Dashboard`] keeps the
//! pending queue reconciled against the IT accounts the backend serves.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
