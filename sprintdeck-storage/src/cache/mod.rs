//! Memoization of resource reachability.
//!
//! Gateways consult a shared [`TableExistenceCache`] before first use of a
//! resource name. Only a confirmed structural absence is remembered; a
//! probe that fails for any other reason is retried on the next lookup.

pub mod existence;

pub use existence::{ExistenceEntry, ExistenceStats, ProbeOutcome, TableExistenceCache};
