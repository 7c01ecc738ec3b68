//! Booking workflow for the PG rental platform.
//!
//! This crate provides:
//! - Room availability tracking over store transactions
//! - The booking workflow engine (submit, verify, reject, cancel, pay)
//! - The admin verification gateway and dashboard reads
//! - Customer booking queries

pub mod availability;
pub mod claim;
pub mod error;
pub mod gateway;
pub mod queries;
pub mod workflow;

pub use claim::PaymentClaim;
pub use error::{ErrorCategory, WorkflowError};
pub use gateway::{AdminGateway, BookingStats, LocationRoomCount};
pub use queries::{BookingQueries, BookingView, RoomView};
pub use workflow::{BookingReceipt, BookingWorkflow, PaymentDecision, PaymentReceipt};
