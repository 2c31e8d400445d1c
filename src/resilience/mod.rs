//! Resilience patterns.
//!
//! # Responsibilities
//! - Back off between retries of a failing operation (the accept loop)
//!
//! # Design Decisions
//! - Exponential growth capped at a configured maximum
//! - Jitter spreads retries of co-located services

pub mod backoff;
