//! # Scope Service
//!
//! Loads assignments through [`AssignmentProvider`] and applies
//! [`scope_for`].

use crate::domain::scope::{scope_for, AccessScope, GlobalRoles};
use crate::error::{ScopeError, ScopeResult};
use crate::ports::inbound::ScopeEvaluator;
use crate::ports::outbound::AssignmentProvider;
use async_trait::async_trait;
use shared_types::{Actor, PartitionId};
use tracing::{debug, warn};

/// The scope evaluator service.
pub struct ScopeService<P: AssignmentProvider> {
    provider: P,
    global_roles: GlobalRoles,
}

impl<P: AssignmentProvider> ScopeService<P> {
    /// Create a service with the default global roles (`super_admin`, `admin`).
    pub fn new(provider: P) -> Self {
        Self::with_global_roles(provider, GlobalRoles::default())
    }

    pub fn with_global_roles(provider: P, global_roles: GlobalRoles) -> Self {
        Self {
            provider,
            global_roles,
        }
    }

    #[must_use]
    pub fn global_roles(&self) -> &GlobalRoles {
        &self.global_roles
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: AssignmentProvider> ScopeEvaluator for ScopeService<P> {
    async fn evaluate_scope(&self, actor: &Actor) -> AccessScope {
        if self.global_roles.contains(actor.role) {
            return AccessScope::global();
        }

        match self.provider.assignments_for(actor.id).await {
            Ok(assignments) => scope_for(actor, &assignments, &self.global_roles),
            Err(e) => {
                warn!(actor_id = %actor.id, error = %e, "Assignment lookup failed, denying all partitions");
                AccessScope::none()
            }
        }
    }

    async fn can_access(&self, actor: &Actor, partition_id: PartitionId) -> bool {
        self.evaluate_scope(actor).await.can_access(&partition_id)
    }

    async fn ensure_access(&self, actor: &Actor, partition_id: PartitionId) -> ScopeResult<()> {
        if self.can_access(actor, partition_id).await {
            return Ok(());
        }

        debug!(
            actor_id = %actor.id,
            role = %actor.role,
            partition_id = %partition_id,
            "Write rejected: out of scope"
        );
        Err(ScopeError::Denied {
            actor_id: actor.id,
            role: actor.role,
            partition_id,
        })
    }
}
