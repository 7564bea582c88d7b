//! Adapters: typed wrappers around the backend's REST and stream channels.

pub mod backend;
pub mod stream;

pub use backend::BackendClient;
pub use stream::SseStreamAdapter;
