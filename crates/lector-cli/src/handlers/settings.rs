//! Settings command handlers.
//!
//! Show, update and reset the stored settings. Clearing the API key
//! also drops the cached voice catalog, since the cache was fetched
//! with that credential.

use anyhow::Result;

use lector_core::ports::keys;
use lector_core::settings::{Settings, SettingsUpdate};

use crate::bootstrap::CliContext;
use crate::commands::SettingsCommand;

/// Execute a settings subcommand.
pub async fn execute(ctx: &CliContext, command: SettingsCommand) -> Result<()> {
    match command {
        SettingsCommand::Show => show(ctx).await,
        SettingsCommand::Set {
            language,
            voice_id,
            voice_name,
            api_key,
        } => {
            set(
                ctx,
                SettingsUpdate {
                    language,
                    voice_id,
                    voice_name,
                    api_key,
                },
            )
            .await
        }
        SettingsCommand::Reset => reset(ctx).await,
    }
}

async fn show(ctx: &CliContext) -> Result<()> {
    let settings = ctx.settings().await?;
    println!("language: {}", settings.language);
    println!("voice:    {} ({})", settings.voice.name, settings.voice.id);
    println!("api key:  {}", mask_key(&settings.api_key));
    Ok(())
}

async fn set(ctx: &CliContext, update: SettingsUpdate) -> Result<()> {
    if update.is_empty() {
        println!("Nothing to change - pass at least one --language/--voice-id/--voice-name/--api-key.");
        return Ok(());
    }

    let clearing_key = update
        .api_key
        .as_deref()
        .is_some_and(|key| key.trim().is_empty());

    let store = ctx.store();
    let mut settings = ctx.settings().await?;
    settings.merge(&update);
    settings.persist_to(store.as_ref()).await?;

    if clearing_key {
        // The cached catalog was fetched with the old key; drop it
        // alongside.
        store.remove(keys::CACHED_VOICES).await?;
        println!("API key cleared; cached voices dropped.");
    }
    println!("Settings updated.");
    Ok(())
}

async fn reset(ctx: &CliContext) -> Result<()> {
    let store = ctx.store();
    store.remove(keys::SETTINGS).await?;
    store.remove(keys::CACHED_VOICES).await?;
    let defaults = Settings::with_defaults();
    println!(
        "Settings reset to defaults ({} / {}).",
        defaults.language, defaults.voice.name
    );
    Ok(())
}

/// Mask an API key for display, keeping only the last four characters.
fn mask_key(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use lector_store::MemoryStore;

    use crate::bootstrap::{CliConfig, bootstrap_with};

    fn context() -> CliContext {
        bootstrap_with(Arc::new(MemoryStore::new()), CliConfig::with_defaults())
    }

    #[test]
    fn masked_key_keeps_only_the_tail() {
        assert_eq!(mask_key(""), "(not set)");
        assert_eq!(mask_key("nk-secret-1234"), "****1234");
        assert_eq!(mask_key("ab"), "****ab");
    }

    #[tokio::test]
    async fn set_merges_only_the_given_fields() {
        let ctx = context();
        execute(
            &ctx,
            SettingsCommand::Set {
                language: None,
                voice_id: None,
                voice_name: None,
                api_key: Some("nk-key".to_string()),
            },
        )
        .await
        .unwrap();

        let settings = ctx.settings().await.unwrap();
        assert_eq!(settings.api_key, "nk-key");
        assert_eq!(settings.language, lector_core::settings::DEFAULT_LANGUAGE);
    }

    #[tokio::test]
    async fn clearing_the_api_key_drops_the_voice_cache() {
        let ctx = context();
        let store = ctx.store();
        store
            .set(keys::CACHED_VOICES, serde_json::json!([{ "voice_id": "v", "name": "V", "lang_code": "en" }]))
            .await
            .unwrap();

        execute(
            &ctx,
            SettingsCommand::Set {
                language: None,
                voice_id: None,
                voice_name: None,
                api_key: Some(String::new()),
            },
        )
        .await
        .unwrap();

        assert_eq!(store.get(keys::CACHED_VOICES).await.unwrap(), None);
    }

    #[tokio::test]
    async fn reset_removes_settings_and_cache() {
        let ctx = context();
        let store = ctx.store();
        execute(
            &ctx,
            SettingsCommand::Set {
                language: Some("es".to_string()),
                voice_id: None,
                voice_name: None,
                api_key: None,
            },
        )
        .await
        .unwrap();
        assert!(store.get(keys::SETTINGS).await.unwrap().is_some());

        execute(&ctx, SettingsCommand::Reset).await.unwrap();
        assert_eq!(store.get(keys::SETTINGS).await.unwrap(), None);
        assert_eq!(
            ctx.settings().await.unwrap().language,
            lector_core::settings::DEFAULT_LANGUAGE
        );
    }
}
