//! Domain layer for the Zyra loop reconciler.
//!
//! Pure models and ports; no I/O, no timers, no framework types.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
