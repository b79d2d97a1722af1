//! Domain layer for the material ledger.

pub mod availability;
pub mod requests;

pub use availability::Availability;
pub use requests::{AdjustmentRequest, ReturnRequest};
