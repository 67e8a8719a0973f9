//! Billing command handlers.

mod process_payment_event;

pub use process_payment_event::{ProcessPaymentEventHandler, ProcessPaymentEventResult};
