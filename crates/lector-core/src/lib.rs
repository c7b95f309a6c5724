#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod events;
pub mod paths;
pub mod ports;
pub mod settings;
pub mod voices;

// Re-export commonly used types for convenience
pub use events::{AlertSeverity, AppEvent};
pub use ports::{
    KeyChange, KeyValueStore, NoopNotifier, SelectionSource, StoreError, UiNotifier, keys,
};
pub use settings::{
    DEFAULT_LANGUAGE, DEFAULT_VOICE_ID, DEFAULT_VOICE_NAME, Settings, SettingsError,
    SettingsUpdate, VoiceSelection, validate_for_reading,
};
pub use voices::{Voice, lang_codes};

pub use paths::{PathError, data_root};
