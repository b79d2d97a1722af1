//! Integration flows, one module per property family.

pub mod support;

mod chain_integrity;
mod concurrency;
mod invalidation;
mod ledger;
mod scope;
