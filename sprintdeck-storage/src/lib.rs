//! Sprintdeck Storage - Remote Store Abstraction and Gateways
//!
//! The [`RemoteStore`] trait is the only boundary to the relational
//! backend. [`FetchGateway`] and [`MutationGateway`] wrap it with
//! loading/error state, notifications and cancellation, and consult a
//! shared [`TableExistenceCache`] when one is attached. [`MemoryStore`]
//! is an in-process implementation for tests and offline use.

pub mod builder;
pub mod cache;
pub mod gateway;
pub mod memory;
pub mod remote;

pub use builder::{QueryBuilder, RemoteQuery, RemoteWrite};
pub use cache::{ExistenceEntry, ExistenceStats, ProbeOutcome, TableExistenceCache};
pub use gateway::{FetchGateway, GatewayState, MutationGateway, MutationOutcome};
pub use memory::{CallKind, MemoryStore, StoreCall};
pub use remote::RemoteStore;
