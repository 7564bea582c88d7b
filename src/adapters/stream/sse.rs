//! SSE stream adapter.
//!
//! Long-lived subscription to the backend's activity stream. Bytes come in
//! arbitrary chunk boundaries; the parser buffers until complete lines and
//! emits one [`StreamEvent`] per `data:` payload. Connection loss is not an
//! error surface: the adapter announces `Reconnecting`, backs off
//! exponentially, and tries again until shut down.

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::Client;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::adapters::backend::models::StreamEventDto;
use crate::domain::models::{BackendConfig, StreamEvent};
use crate::services::reconciler::StreamSignal;

/// Incremental parser for an SSE byte stream.
///
/// Only `data:` lines are consumed; comments, event ids, and blank
/// separators are skipped. Malformed payloads are logged and dropped
/// rather than killing the stream.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns every event completed by it.
    pub fn push(&mut self, chunk: &Bytes) -> Vec<StreamEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            if let Some(event) = Self::parse_line(line.trim_end()) {
                events.push(event);
            }
        }
        events
    }

    fn parse_line(line: &str) -> Option<StreamEvent> {
        let data = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:"))?;
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            return None;
        }

        match serde_json::from_str::<StreamEventDto>(data) {
            Ok(dto) => Some(dto.into()),
            Err(err) => {
                warn!(error = %err, payload = data, "dropping malformed stream event");
                None
            }
        }
    }
}

/// Adapter owning the SSE connection loop.
pub struct SseStreamAdapter {
    http: Client,
    url: String,
    api_token: Option<String>,
}

impl SseStreamAdapter {
    /// Build an adapter for the backend's stream endpoint.
    pub fn new(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        // No overall timeout: the stream is meant to live indefinitely.
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            url: format!("{}/stream", config.base_url.trim_end_matches('/')),
            api_token: config.api_token.clone(),
        })
    }

    /// Spawn the connection loop. Signals flow into `tx`; a message on
    /// `shutdown_rx` (or `tx` closing) ends the task.
    pub fn spawn(
        self,
        tx: mpsc::Sender<StreamSignal>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut backoff = reconnect_backoff();

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    connected = self.run_connection(&tx) => {
                        if tx.is_closed() {
                            break;
                        }
                        if connected {
                            // A connection that actually served events resets
                            // the backoff schedule.
                            backoff.reset();
                        }
                        if tx.send(StreamSignal::Reconnecting).await.is_err() {
                            break;
                        }
                        let delay = backoff
                            .next_backoff()
                            .unwrap_or(Duration::from_secs(30));
                        debug!(delay_ms = delay.as_millis() as u64, "stream reconnect backoff");
                        tokio::select! {
                            _ = shutdown_rx.recv() => break,
                            () = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
            info!("stream adapter stopped");
        })
    }

    /// One connection attempt. Returns whether any event was delivered.
    async fn run_connection(&self, tx: &mpsc::Sender<StreamSignal>) -> bool {
        let mut request = self
            .http
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "text/event-stream");
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "stream endpoint refused connection");
                return false;
            }
            Err(err) => {
                warn!(error = %err, "stream connection failed");
                return false;
            }
        };

        if tx.send(StreamSignal::Connected).await.is_err() {
            return false;
        }
        info!(url = %self.url, "stream connected");

        let mut parser = SseParser::new();
        let mut delivered = false;
        let mut bytes = response.bytes_stream();

        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    for event in parser.push(&chunk) {
                        delivered = true;
                        if tx.send(StreamSignal::Event(event)).await.is_err() {
                            return delivered;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "stream read error");
                    break;
                }
            }
        }

        delivered
    }
}

fn reconnect_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(500),
        max_interval: Duration::from_secs(30),
        // Never give up; the reconciler decides when to stop caring.
        max_elapsed_time: None,
        ..ExponentialBackoff::default()
    }
}
