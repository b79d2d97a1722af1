//! # Mutation-Commit Pipeline
//!
//! Authorization, conditional write, audit append and invalidation event as
//! one unit.

pub mod error;
pub mod gateway;
pub mod records;

pub use error::{CommitError, CommitResult, ErrorKind};
pub use gateway::{Change, Committed, MutationGateway};
pub use records::{AuditedRecords, Mutator, RecordPipeline};
