//! # cronx-resilience
//!
//! The timeout wrapper the runner races each executor attempt against.
//! Retry counting and backoff delay live with the job data model in
//! `cronx-core`, since the exact formula is part of the job's contract,
//! not a generic resilience policy.

pub mod timeout;

pub use timeout::with_timeout;
