//! crates/pet_diary_core/src/persona.rs
//!
//! The client-side cache of previously used pet personas.
//!
//! This collection is never synchronized with the server; it lives wherever
//! the embedding client keeps local state, which is why the whole type is
//! serde round-trippable. The server does not touch it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::prompt::DEFAULT_FIRST_PERSON;

/// A pet persona remembered from an earlier diary entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPersona {
    pub id: Uuid,
    pub pet_name: String,
    pub pet_characteristics: String,
    pub first_person_pronoun: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

/// The full persona collection, kept sorted by `last_used_at` descending
/// after every mutation so the most recently used pet is always first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonaCache {
    personas: Vec<SavedPersona>,
}

impl PersonaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn personas(&self) -> &[SavedPersona] {
        &self.personas
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    /// Saves a persona, upserting by pet name: a matching name updates that
    /// entry's characteristics, pronoun and `last_used_at` instead of adding
    /// a duplicate. A blank pronoun falls back to the default.
    ///
    /// Returns the id of the created or updated entry.
    pub fn save(&mut self, pet_name: &str, characteristics: &str, pronoun: &str) -> Uuid {
        let now = Utc::now();
        let pronoun = if pronoun.trim().is_empty() {
            DEFAULT_FIRST_PERSON
        } else {
            pronoun.trim()
        };

        let id = match self.personas.iter_mut().find(|p| p.pet_name == pet_name) {
            Some(existing) => {
                existing.pet_characteristics = characteristics.to_string();
                existing.first_person_pronoun = pronoun.to_string();
                existing.last_used_at = now;
                existing.id
            }
            None => {
                let persona = SavedPersona {
                    id: Uuid::new_v4(),
                    pet_name: pet_name.to_string(),
                    pet_characteristics: characteristics.to_string(),
                    first_person_pronoun: pronoun.to_string(),
                    created_at: now,
                    last_used_at: now,
                };
                let id = persona.id;
                self.personas.push(persona);
                id
            }
        };

        self.sort_by_recency();
        id
    }

    /// Records that a persona was used again. Returns false for unknown ids.
    pub fn touch(&mut self, id: Uuid) -> bool {
        match self.personas.iter_mut().find(|p| p.id == id) {
            Some(persona) => {
                persona.last_used_at = Utc::now();
                self.sort_by_recency();
                true
            }
            None => false,
        }
    }

    /// Deletes a persona. Returns false for unknown ids.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.personas.len();
        self.personas.retain(|p| p.id != id);
        before != self.personas.len()
    }

    fn sort_by_recency(&mut self) {
        self.personas
            .sort_by(|a, b| b.last_used_at.cmp(&a.last_used_at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn save_creates_a_new_persona() {
        let mut cache = PersonaCache::new();
        let id = cache.save("ポチ", "元気いっぱい", "ぼく");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.personas()[0].id, id);
        assert_eq!(cache.personas()[0].pet_name, "ポチ");
    }

    #[test]
    fn save_upserts_by_pet_name_without_duplicating() {
        let mut cache = PersonaCache::new();
        let first = cache.save("ポチ", "元気いっぱい", "ぼく");
        let second = cache.save("ポチ", "すこし臆病", "わたし");

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.personas()[0].pet_characteristics, "すこし臆病");
        assert_eq!(cache.personas()[0].first_person_pronoun, "わたし");
    }

    #[test]
    fn blank_pronoun_defaults() {
        let mut cache = PersonaCache::new();
        cache.save("タマ", "", "  ");
        assert_eq!(
            cache.personas()[0].first_person_pronoun,
            DEFAULT_FIRST_PERSON
        );
    }

    #[test]
    fn collection_stays_sorted_by_last_used_descending() {
        let mut cache = PersonaCache::new();
        let pochi = cache.save("ポチ", "", "ぼく");
        std::thread::sleep(Duration::from_millis(10));
        cache.save("タマ", "", "わたし");

        assert_eq!(cache.personas()[0].pet_name, "タマ");

        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.touch(pochi));
        assert_eq!(cache.personas()[0].pet_name, "ポチ");
    }

    #[test]
    fn touch_and_remove_report_unknown_ids() {
        let mut cache = PersonaCache::new();
        let id = cache.save("ポチ", "", "ぼく");

        assert!(!cache.touch(Uuid::new_v4()));
        assert!(!cache.remove(Uuid::new_v4()));
        assert_eq!(cache.len(), 1);

        assert!(cache.remove(id));
        assert!(cache.is_empty());
    }

    #[test]
    fn serde_round_trip_preserves_entries() {
        let mut cache = PersonaCache::new();
        cache.save("ポチ", "元気いっぱい", "ぼく");
        cache.save("タマ", "まいぺーす", "わたし");

        let json = serde_json::to_string(&cache).unwrap();
        let restored: PersonaCache = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.personas()[0].id, cache.personas()[0].id);
        assert_eq!(restored.personas()[1].pet_name, cache.personas()[1].pet_name);
    }
}
