//! Read command handler.
//!
//! Reads explicit text or the stored selection through the speech
//! pipeline. In `--follow` mode the process stays alive, feeds stdin
//! lines into the selection key and reads every selection change, so
//! one terminal closes the whole select - store - read loop.

use anyhow::Result;
use serde_json::Value;
use tokio::io::AsyncBufReadExt;
use tokio::sync::broadcast::error::RecvError;

use lector_core::events::AppEvent;
use lector_core::ports::{SelectionSource, UiNotifier, keys};
use lector_speech::{PipelineEvent, ReaderPipeline, ReaderState};

use crate::bootstrap::CliContext;
use crate::emitter::ConsoleNotifier;

/// Arguments for the read command.
pub struct ReadArgs {
    /// Explicit text; `None` falls back to the stored selection.
    pub text: Option<String>,
    /// Playback speed multiplier.
    pub speed: f32,
    /// Subscribe to selection changes instead of exiting after one
    /// read.
    pub follow: bool,
}

/// Execute the read command.
pub async fn execute(ctx: &CliContext, args: ReadArgs, verbose: bool) -> Result<()> {
    let notifier = ConsoleNotifier::new(verbose);
    if args.follow {
        follow(ctx, &args, &notifier).await
    } else {
        read_once(ctx, args.text.as_deref(), args.speed, &notifier).await
    }
}

/// Run one session to completion, with Ctrl-C cancelling it.
async fn read_once(
    ctx: &CliContext,
    text: Option<&str>,
    speed: f32,
    notifier: &ConsoleNotifier,
) -> Result<()> {
    let Some(text) = resolve_text(ctx, text).await? else {
        println!("Nothing to read - pass TEXT or store a selection with `lector select`.");
        return Ok(());
    };

    let settings = ctx.settings().await?;
    let (pipeline, mut events) = ctx.reader(speed)?;
    pipeline.start(&text, &settings).await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                pipeline.cancel();
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                let done = matches!(event, PipelineEvent::StateChanged(ReaderState::Idle));
                notifier.notify(event.ui_event());
                if done {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Subscribe to the selection key and read each new selection.
async fn follow(ctx: &CliContext, args: &ReadArgs, notifier: &ConsoleNotifier) -> Result<()> {
    let (pipeline, mut events) = ctx.reader(args.speed)?;

    let forward_to = notifier.clone();
    let forward = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            forward_to.notify(event.ui_event());
        }
    });

    // Stdin lines become selections, so a single process exercises
    // both sides of the store.
    let selection = ctx.selection();
    let stdin_feed = tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Err(e) = selection.update(&line).await {
                tracing::warn!(error = %e, "failed to store stdin selection");
            }
        }
    });

    let mut changes = ctx.store().subscribe();
    println!("Following selection changes - Ctrl-C to stop.");

    // Read whatever is already there before waiting for changes.
    if let Some(text) = resolve_text(ctx, args.text.as_deref()).await? {
        start_reading(ctx, &pipeline, &text, notifier).await;
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            change = changes.recv() => match change {
                Ok(change) if change.key == keys::HIGHLIGHTED_TEXT => {
                    let text = change
                        .new
                        .as_ref()
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .trim()
                        .to_string();
                    if !text.is_empty() {
                        start_reading(ctx, &pipeline, &text, notifier).await;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "selection feed lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    pipeline.cancel();
    stdin_feed.abort();
    drop(pipeline);
    let _ = forward.await;
    Ok(())
}

/// Start a session for `text`, replacing one still underway. Failures
/// surface as alerts; following continues.
async fn start_reading(
    ctx: &CliContext,
    pipeline: &ReaderPipeline,
    text: &str,
    notifier: &ConsoleNotifier,
) {
    if pipeline.is_reading() {
        pipeline.cancel();
    }
    match ctx.settings().await {
        Ok(settings) => {
            if let Err(e) = pipeline.start(text, &settings).await {
                notifier.notify(AppEvent::Alert {
                    severity: e.severity(),
                    message: e.to_string(),
                });
            }
        }
        Err(e) => notifier.notify(AppEvent::error(e.to_string())),
    }
}

/// Explicit text when given, the stored selection otherwise; `None`
/// when both are empty.
async fn resolve_text(ctx: &CliContext, explicit: Option<&str>) -> Result<Option<String>> {
    if let Some(text) = explicit {
        let text = text.trim();
        return Ok((!text.is_empty()).then(|| text.to_string()));
    }
    let stored = ctx.selection().current().await?;
    Ok((!stored.is_empty()).then_some(stored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::bootstrap::{CliConfig, bootstrap_with};
    use lector_store::MemoryStore;

    fn context() -> CliContext {
        bootstrap_with(Arc::new(MemoryStore::new()), CliConfig::with_defaults())
    }

    #[tokio::test]
    async fn explicit_text_wins_over_the_stored_selection() {
        let ctx = context();
        ctx.selection().update("stored words").await.unwrap();

        let resolved = resolve_text(&ctx, Some("  explicit  ")).await.unwrap();
        assert_eq!(resolved.as_deref(), Some("explicit"));
    }

    #[tokio::test]
    async fn stored_selection_is_the_fallback() {
        let ctx = context();
        ctx.selection().update("stored words").await.unwrap();

        let resolved = resolve_text(&ctx, None).await.unwrap();
        assert_eq!(resolved.as_deref(), Some("stored words"));
    }

    #[tokio::test]
    async fn nothing_to_read_resolves_to_none() {
        let ctx = context();
        assert_eq!(resolve_text(&ctx, None).await.unwrap(), None);
        assert_eq!(resolve_text(&ctx, Some("   ")).await.unwrap(), None);
    }
}
