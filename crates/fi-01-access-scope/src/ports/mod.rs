//! Ports for the scope evaluator.

pub mod inbound;
pub mod outbound;

pub use inbound::ScopeEvaluator;
pub use outbound::AssignmentProvider;
