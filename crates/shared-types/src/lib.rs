//! # Shared Types Crate
//!
//! This crate contains the identifiers, record states and hashing helpers
//! shared by every integrity subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Typed Payloads**: Before/after states of audited mutations are a tagged
//!   union over known entity types ([`RecordState`]) with an explicit opaque
//!   fallback, never an untyped map.
//! - **Deterministic Hashing**: [`canonical`] produces one byte sequence per
//!   logical value regardless of field declaration order or map features.

pub mod canonical;
pub mod entities;
pub mod errors;
pub mod state;
pub mod time;

pub use canonical::{canonical_json, hash_hex, parse_hash_hex, sha256};
pub use entities::*;
pub use errors::*;
pub use state::*;
pub use time::{ManualClock, SystemTimeSource, TimeSource};
