//! Voices command handler.
//!
//! Lists the voice catalog in a table, annotated with whether it came
//! from the service or the local cache.

use anyhow::Result;

use lector_core::ports::keys;
use lector_core::voices::lang_codes;
use lector_speech::{VoicesClient, list_voices};

use crate::bootstrap::CliContext;

/// Execute the voices command.
pub async fn execute(ctx: &CliContext, refresh: bool, languages: bool) -> Result<()> {
    let settings = ctx.settings().await?;
    let store = ctx.store();

    if refresh {
        store.remove(keys::CACHED_VOICES).await?;
    }

    let api = VoicesClient::new(ctx.host())?;
    let listing = list_voices(&api, store.as_ref(), &settings.api_key).await?;

    if listing.voices.is_empty() {
        println!("No voices available.");
        println!("Set an API key with `lector settings set --api-key <KEY>`.");
        return Ok(());
    }

    if languages {
        for code in lang_codes(&listing.voices) {
            println!("{code}");
        }
        return Ok(());
    }

    let source = if listing.from_cache { "cached" } else { "live" };
    println!("Found {} voice(s) ({source}):\n", listing.voices.len());
    println!("{:<38} {:<20} {:<6} Tags", "ID", "Name", "Lang");
    println!("{}", "-".repeat(80));
    for voice in &listing.voices {
        println!(
            "{:<38} {:<20} {:<6} {}",
            voice.voice_id,
            voice.name,
            voice.lang_code,
            voice.tags.join(", ")
        );
    }
    Ok(())
}
