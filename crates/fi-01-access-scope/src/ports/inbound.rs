//! # Inbound Ports (Driving Ports)
//!
//! The API the commit pipeline and read paths use to evaluate scope.

use crate::domain::scope::AccessScope;
use crate::error::ScopeResult;
use async_trait::async_trait;
use shared_types::{Actor, PartitionId};

/// Primary API of the scope evaluator.
#[async_trait]
pub trait ScopeEvaluator: Send + Sync {
    /// Evaluate the actor's scope.
    ///
    /// Never fails: a lookup error yields [`AccessScope::none`].
    async fn evaluate_scope(&self, actor: &Actor) -> AccessScope;

    /// `is_global OR partition ∈ partitions`. Never fails.
    async fn can_access(&self, actor: &Actor, partition_id: PartitionId) -> bool;

    /// Write-path check.
    ///
    /// ## Errors
    ///
    /// - `Denied`: the actor is out of scope for `partition_id`
    async fn ensure_access(&self, actor: &Actor, partition_id: PartitionId) -> ScopeResult<()>;
}
