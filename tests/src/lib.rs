//! # Foundry Integrity Test Suite
//!
//! Cross-crate flows that exercise the integrity core the way a business
//! module would: through `IntegrityContainer` and its mutation gateway.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── support.rs          # Shared fixture
//!     ├── chain_integrity.rs  # Linking, tamper detection, file-backed chain
//!     ├── concurrency.rs      # Lost updates, concurrent writers
//!     ├── ledger.rs           # Exact boundary, non-negativity under load
//!     ├── scope.rs            # Partition scoping of writes and reads
//!     └── invalidation.rs     # Debounced, scoped invalidation delivery
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p fi-tests
//! cargo test -p fi-tests integration::ledger::
//! cargo bench -p fi-tests
//! ```

pub mod integration;
