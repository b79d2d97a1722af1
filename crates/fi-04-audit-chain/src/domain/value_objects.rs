//! Audit chain configuration.

/// Default number of trail entries returned when the caller gives no limit.
pub const DEFAULT_TRAIL_LIMIT: usize = 50;

/// Hard cap on trail entries per request.
pub const MAX_TRAIL_LIMIT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditConfig {
    pub trail_default_limit: usize,
    pub trail_max_limit: usize,
}

impl AuditConfig {
    /// Resolve a caller-supplied trail limit into `1..=trail_max_limit`.
    #[must_use]
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.trail_default_limit)
            .clamp(1, self.trail_max_limit.max(1))
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            trail_default_limit: DEFAULT_TRAIL_LIMIT,
            trail_max_limit: MAX_TRAIL_LIMIT,
        }
    }
}
