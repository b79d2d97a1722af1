//! # Integrity Configuration
//!
//! Unified configuration for every integrity subsystem.
//!
//! Each section has production defaults and can be overridden from `FI_*`
//! environment variables through [`IntegrityConfig::from_env`].

use fi_01_access_scope::GlobalRoles;
use fi_04_audit_chain::AuditConfig;
use shared_types::Role;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Complete integrity-core configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityConfig {
    pub scope: ScopeConfig,
    pub concurrency: ConcurrencyConfig,
    pub audit: AuditSettings,
    pub invalidation: InvalidationConfig,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("{var}={value:?} is not valid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Debounce window {0} ms is outside 250..=500 ms")]
    DebounceWindow(u64),

    #[error("Event bus capacity must be at least 1")]
    ZeroBusCapacity,

    #[error("Trail default limit {default} exceeds maximum {max}")]
    TrailLimits { default: usize, max: usize },

    #[error("At least one update attempt is required")]
    ZeroUpdateAttempts,
}

/// Authorization scope settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeConfig {
    /// Roles that bypass partition assignments.
    pub global_roles: Vec<Role>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            global_roles: vec![Role::SuperAdmin, Role::Admin],
        }
    }
}

impl ScopeConfig {
    #[must_use]
    pub fn global_roles(&self) -> GlobalRoles {
        GlobalRoles::new(self.global_roles.iter().copied())
    }
}

/// Optimistic concurrency settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencyConfig {
    /// Attempts made by the opt-in retry helper.
    pub max_update_attempts: u32,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_update_attempts: 3,
        }
    }
}

/// Audit chain settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSettings {
    pub trail_default_limit: usize,
    pub trail_max_limit: usize,
    /// JSON-lines log; `None` keeps the chain in memory.
    pub log_path: Option<PathBuf>,
}

impl Default for AuditSettings {
    fn default() -> Self {
        let defaults = AuditConfig::default();
        Self {
            trail_default_limit: defaults.trail_default_limit,
            trail_max_limit: defaults.trail_max_limit,
            log_path: None,
        }
    }
}

impl AuditSettings {
    #[must_use]
    pub fn audit_config(&self) -> AuditConfig {
        AuditConfig {
            trail_default_limit: self.trail_default_limit,
            trail_max_limit: self.trail_max_limit,
        }
    }
}

/// Invalidation router settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationConfig {
    pub debounce_window_ms: u64,
    pub bus_capacity: usize,
}

impl Default for InvalidationConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: 400,
            bus_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl InvalidationConfig {
    #[must_use]
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }
}

impl IntegrityConfig {
    /// Load configuration from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `FI_GLOBAL_ROLES`: comma-separated roles (default: super_admin,admin)
    /// - `FI_MAX_UPDATE_ATTEMPTS`: retry helper attempts (default: 3)
    /// - `FI_TRAIL_DEFAULT_LIMIT` / `FI_TRAIL_MAX_LIMIT`: trail sizes (default: 50 / 500)
    /// - `FI_AUDIT_LOG_PATH`: file-backed audit log (default: in memory)
    /// - `FI_DEBOUNCE_WINDOW_MS`: invalidation debounce (default: 400)
    /// - `FI_BUS_CAPACITY`: event bus buffer (default: 1000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("FI_GLOBAL_ROLES") {
            config.scope.global_roles = value
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    s.parse::<Role>().map_err(|e| ConfigError::InvalidValue {
                        var: "FI_GLOBAL_ROLES",
                        value: value.clone(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(n) = parse_var(&lookup, "FI_MAX_UPDATE_ATTEMPTS")? {
            config.concurrency.max_update_attempts = n;
        }
        if let Some(n) = parse_var(&lookup, "FI_TRAIL_DEFAULT_LIMIT")? {
            config.audit.trail_default_limit = n;
        }
        if let Some(n) = parse_var(&lookup, "FI_TRAIL_MAX_LIMIT")? {
            config.audit.trail_max_limit = n;
        }
        if let Some(path) = lookup("FI_AUDIT_LOG_PATH").filter(|p| !p.trim().is_empty()) {
            config.audit.log_path = Some(PathBuf::from(path));
        }
        if let Some(ms) = parse_var(&lookup, "FI_DEBOUNCE_WINDOW_MS")? {
            config.invalidation.debounce_window_ms = ms;
        }
        if let Some(n) = parse_var(&lookup, "FI_BUS_CAPACITY")? {
            config.invalidation.bus_capacity = n;
        }

        Ok(config)
    }

    /// Reject settings the subsystems cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let window = self.invalidation.debounce_window_ms;
        if !(250..=500).contains(&window) {
            return Err(ConfigError::DebounceWindow(window));
        }
        if self.invalidation.bus_capacity == 0 {
            return Err(ConfigError::ZeroBusCapacity);
        }
        if self.audit.trail_default_limit > self.audit.trail_max_limit {
            return Err(ConfigError::TrailLimits {
                default: self.audit.trail_default_limit,
                max: self.audit.trail_max_limit,
            });
        }
        if self.concurrency.max_update_attempts == 0 {
            return Err(ConfigError::ZeroUpdateAttempts);
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                var,
                reason: e.to_string(),
                value,
            }),
    }
}
