//! Foundation module containing shared domain primitives.
//!
//! These types are used across the domain layer:
//! - Strongly-typed identifiers (`UserId`, `OrderId`, `DeliveryId`)
//! - `Timestamp` value object for UTC points in time
//! - Error types (`DomainError`, `ErrorCode`, `ValidationError`)
//! - `StateMachine` trait for lifecycle status enums

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{DeliveryId, OrderId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
