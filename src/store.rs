//! Persistence collaborator: translations keyed by their source text.
//!
//! The durable database lives outside this crate; only the consumed
//! contract and an in-memory implementation (used by tests and the CLI
//! session cache) are provided here.

use anyhow::Result;
use std::collections::HashMap;

use crate::translate::Translation;

/// A stored translation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTranslation {
    pub original: String,
    pub translation: Translation,
    pub audio_id: Option<String>,
}

/// Trait for translation persistence
pub trait TranslationStore: Send {
    /// Store a translation keyed by its source text
    fn store(
        &mut self,
        original: &str,
        translation: &Translation,
        audio_id: Option<&str>,
    ) -> Result<()>;

    /// Look up a previously stored translation
    fn lookup(&self, original: &str) -> Option<StoredTranslation>;
}

/// In-memory store; doubles as a per-session cache so repeated copies of
/// the same text skip the backend round-trip
#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, StoredTranslation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TranslationStore for MemoryStore {
    fn store(
        &mut self,
        original: &str,
        translation: &Translation,
        audio_id: Option<&str>,
    ) -> Result<()> {
        self.entries.insert(
            original.to_string(),
            StoredTranslation {
                original: original.to_string(),
                translation: translation.clone(),
                audio_id: audio_id.map(|id| id.to_string()),
            },
        );
        Ok(())
    }

    fn lookup(&self, original: &str) -> Option<StoredTranslation> {
        self.entries.get(original).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_translation() -> Translation {
        Translation {
            meaning_english: "hello".to_string(),
            pinyin_mandarin: "nǐ hǎo".to_string(),
            jyutping_cantonese: "nei5 hou2".to_string(),
            equivalent_cantonese: "你好".to_string(),
            audio_id: None,
        }
    }

    #[test]
    fn test_store_and_lookup() {
        let mut store = MemoryStore::new();
        let translation = sample_translation();

        store.store("你好", &translation, Some("a1")).unwrap();

        let record = store.lookup("你好").expect("record should exist");
        assert_eq!(record.translation, translation);
        assert_eq!(record.audio_id.as_deref(), Some("a1"));

        assert!(store.lookup("谢谢").is_none());
    }

    #[test]
    fn test_store_replaces_existing() {
        let mut store = MemoryStore::new();
        let translation = sample_translation();

        store.store("你好", &translation, None).unwrap();
        store.store("你好", &translation, Some("a2")).unwrap();

        assert_eq!(store.len(), 1);
        let record = store.lookup("你好").unwrap();
        assert_eq!(record.audio_id.as_deref(), Some("a2"));
    }
}
