//! Domain layer for the scope evaluator.

pub mod scope;

pub use scope::{scope_for, AccessScope, GlobalRoles};
