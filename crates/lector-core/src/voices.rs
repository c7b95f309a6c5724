//! Voice catalog domain types.

use serde::{Deserialize, Serialize};

/// One voice offered by the speech service.
///
/// Field names follow the service's `/voices` payload so catalog
/// entries round-trip through the store cache unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Service voice identifier.
    pub voice_id: String,
    /// Human-readable name.
    pub name: String,
    /// Language code this voice speaks (e.g. `en`).
    pub lang_code: String,
    /// Service-assigned tags such as "Female" or "American".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Unique language codes across a catalog, sorted for stable display.
#[must_use]
pub fn lang_codes(voices: &[Voice]) -> Vec<String> {
    let mut codes: Vec<String> = voices.iter().map(|v| v.lang_code.clone()).collect();
    codes.sort();
    codes.dedup();
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(id: &str, lang: &str) -> Voice {
        Voice {
            voice_id: id.to_string(),
            name: id.to_uppercase(),
            lang_code: lang.to_string(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn lang_codes_dedupes_and_sorts() {
        let catalog = vec![
            voice("a", "es"),
            voice("b", "en"),
            voice("c", "es"),
            voice("d", "de"),
        ];
        assert_eq!(lang_codes(&catalog), vec!["de", "en", "es"]);
    }

    #[test]
    fn lang_codes_of_empty_catalog_is_empty() {
        assert!(lang_codes(&[]).is_empty());
    }

    #[test]
    fn deserializes_without_tags() {
        let voice: Voice =
            serde_json::from_str(r#"{"voice_id":"v1","name":"Emily","lang_code":"en"}"#).unwrap();
        assert!(voice.tags.is_empty());
    }
}
