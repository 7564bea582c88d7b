//! `zyra watch` - run the reconciler and render live loop progress.
//!
//! Spawns the stream adapter and the reconciler, then renders updates:
//! spinner prefix carries the phase badge, spinner message carries the
//! rotating narration, activity and notices print above the spinner.
//! Ctrl-C tears everything down through one shutdown channel.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use console::style;
use tokio::sync::{broadcast, mpsc};

use crate::adapters::{BackendClient, SseStreamAdapter};
use crate::cli::display::format::{phase_badge, status_glyph};
use crate::cli::display::progress::create_spinner;
use crate::domain::models::{Config, DetectionPhase, Phase};
use crate::domain::ports::BackendApi;
use crate::services::narrator::Narrator;
use crate::services::reconciler::{LoopUpdate, Reconciler, ReconcilerConfig};

pub async fn execute(config: &Config, json: bool) -> Result<()> {
    let backend: Arc<dyn BackendApi> = Arc::new(BackendClient::new(&config.backend)?);

    let (shutdown_tx, _) = broadcast::channel(1);
    let (stream_tx, stream_rx) = mpsc::channel(256);

    let sse = SseStreamAdapter::new(&config.backend)?;
    let sse_handle = sse.spawn(stream_tx, shutdown_tx.subscribe());

    let reconciler = Reconciler::new(backend, ReconcilerConfig::from(config));
    let handle = reconciler.spawn(stream_rx, shutdown_tx.subscribe());
    let mut updates = handle.subscribe();

    let spinner = (!json).then(create_spinner);
    let rotate = Duration::from_millis(config.narrator.rotate_ms);
    let mut rotation = 0usize;
    let mut phase = Phase::Detect;
    let mut detection_stage: Option<DetectionPhase> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            () = tokio::time::sleep(rotate) => {
                rotation += 1;
                if let Some(ref spinner) = spinner {
                    spinner.set_message(Narrator::describe(phase, detection_stage, rotation));
                }
            }
            update = updates.recv() => match update {
                Ok(update) => {
                    render_update(&update, spinner.as_ref(), json, &mut phase, &mut detection_stage, rotation);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "watch fell behind the update stream");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let _ = shutdown_tx.send(());
    handle.join().await;
    let _ = sse_handle.await;
    Ok(())
}

fn render_update(
    update: &LoopUpdate,
    spinner: Option<&indicatif::ProgressBar>,
    json: bool,
    phase: &mut Phase,
    detection_stage: &mut Option<DetectionPhase>,
    rotation: usize,
) {
    if json {
        if let LoopUpdate::Phase { resolution, .. } = update {
            if let Ok(line) = serde_json::to_string(resolution) {
                println!("{line}");
            }
        }
        return;
    }
    let Some(spinner) = spinner else { return };

    match update {
        LoopUpdate::Phase {
            resolution,
            detection_stage: stage,
        } => {
            *phase = resolution.phase;
            *detection_stage = *stage;
            spinner.set_prefix(phase_badge(resolution.phase));
            spinner.set_message(Narrator::describe(*phase, *detection_stage, rotation));
        }
        LoopUpdate::Activity(event) => {
            spinner.println(format!(
                "{} {} {}",
                status_glyph(event.status),
                style(event.resolved_phase()).dim(),
                event.message
            ));
        }
        LoopUpdate::Notice { message, .. } => {
            spinner.println(style(format!("note: {message}")).yellow().to_string());
        }
        LoopUpdate::ExecutionOutcome(result) => {
            spinner.println(format!(
                "{} {} ({} changes{})",
                style("✓").green(),
                result.action_label,
                result.total_changes,
                result
                    .estimated_impact
                    .as_deref()
                    .map(|i| format!(", {i}"))
                    .unwrap_or_default()
            ));
        }
    }
}
