//! Push-stream adapter.

pub mod sse;

pub use sse::{SseParser, SseStreamAdapter};
