//! Select command handler.
//!
//! Terminal stand-in for the in-page text selection: stores trimmed
//! text under the shared selection key, where `read` (and `read
//! --follow` in another terminal) picks it up.

use anyhow::Result;
use tokio::io::AsyncBufReadExt;

use crate::bootstrap::CliContext;

/// Execute the select command.
pub async fn execute(ctx: &CliContext, text: Option<String>, watch: bool) -> Result<()> {
    let selection = ctx.selection();

    if watch {
        println!("Storing each stdin line as the selection - Ctrl-D to stop.");
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        let mut stored: usize = 0;
        while let Some(line) = lines.next_line().await? {
            selection.update(&line).await?;
            if !line.trim().is_empty() {
                stored += 1;
            }
        }
        println!("Stored {stored} selection(s).");
        return Ok(());
    }

    let text = text.unwrap_or_default();
    let trimmed = text.trim();
    selection.update(&text).await?;
    if trimmed.is_empty() {
        println!("Selection cleared.");
    } else {
        println!("Selection stored ({} chars).", trimmed.chars().count());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use lector_core::ports::{SelectionSource, keys};
    use lector_store::MemoryStore;

    use crate::bootstrap::{CliConfig, bootstrap_with};

    #[tokio::test]
    async fn select_stores_trimmed_text() {
        let ctx = bootstrap_with(Arc::new(MemoryStore::new()), CliConfig::with_defaults());
        execute(&ctx, Some("  some words  ".to_string()), false)
            .await
            .unwrap();
        assert_eq!(ctx.selection().current().await.unwrap(), "some words");
    }

    #[tokio::test]
    async fn empty_select_clears_the_key() {
        let ctx = bootstrap_with(Arc::new(MemoryStore::new()), CliConfig::with_defaults());
        ctx.selection().update("old").await.unwrap();

        execute(&ctx, None, false).await.unwrap();
        assert_eq!(
            ctx.store().get(keys::HIGHLIGHTED_TEXT).await.unwrap(),
            None
        );
    }
}
