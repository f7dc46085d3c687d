//! # cronx-store
//!
//! Embedded SQLite persistence for job state and run history. The
//! scheduler is the only holder of a [`CronxStore`] reference; this
//! crate makes no concurrency guarantees beyond serialized access from
//! a single caller.

pub mod error;
pub mod pool;
pub mod store;

pub use error::StoreError;
pub use pool::StorePool;
pub use store::CronxStore;
