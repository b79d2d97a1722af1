//! # Integrity Container
//!
//! Holds every subsystem instance and wires them in dependency order:
//! scope evaluator, audit chain, ledger, event bus, then the gateway that
//! ties them together.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, IntegrityConfig};
pub use subsystems::{IntegrityContainer, Ledger, Scopes};
