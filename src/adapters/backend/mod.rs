//! Backend REST adapter.

pub mod client;
pub mod models;

pub use client::BackendClient;
