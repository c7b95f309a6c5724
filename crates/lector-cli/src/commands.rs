//! Subcommand definitions for the `lector` binary.

use clap::Subcommand;

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Read text aloud, or the stored selection when TEXT is omitted
    Read {
        /// Text to read
        text: Option<String>,

        /// Playback speed multiplier (clamped to 0.5-2.0)
        #[arg(long, default_value_t = 1.0)]
        speed: f32,

        /// Keep running and read every new selection as it is stored
        #[arg(long)]
        follow: bool,
    },

    /// Store the current text selection
    Select {
        /// Text to store; omit (or pass an empty string) to clear
        text: Option<String>,

        /// Stream stdin lines into the selection, one per line
        #[arg(long)]
        watch: bool,
    },

    /// List the available voices
    Voices {
        /// Fetch from the service even when a cached catalog exists
        #[arg(long)]
        refresh: bool,

        /// Print only the distinct language codes
        #[arg(long)]
        languages: bool,
    },

    /// View or change stored settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

/// Settings command variants.
#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show current settings (API key masked)
    Show,

    /// Update settings; only the given fields change
    Set {
        /// Language code the voices speak, e.g. "en"
        #[arg(long)]
        language: Option<String>,

        /// Service voice identifier
        #[arg(long)]
        voice_id: Option<String>,

        /// Display name for the chosen voice
        #[arg(long)]
        voice_name: Option<String>,

        /// Speech service API key; pass an empty string to clear it
        #[arg(long, env = "LECTOR_API_KEY")]
        api_key: Option<String>,
    },

    /// Restore default settings and drop the cached voice catalog
    Reset,
}
