// src/integrations/mod.rs
//
// Boundary code: backend transport, response envelopes, toasts

pub mod envelope;
pub mod notifier;
pub mod rest;

pub use envelope::{extract_total, normalize, unwrap_record, Envelope};
pub use notifier::{LogNotifier, Notifier};
pub use rest::RestGateway;
