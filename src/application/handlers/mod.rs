//! Command handlers, grouped by domain module.

pub mod billing;

pub use billing::{ProcessPaymentEventHandler, ProcessPaymentEventResult};
