//! services/api/src/adapters/json_store.rs
//!
//! This module contains the JSON-file store adapter, which is the concrete
//! implementation of the `DiaryStore` port from the `core` crate. The entire
//! collection lives in a single JSON document that is read and replaced
//! whole; callers own read-modify-write serialization.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use pet_diary_core::domain::{normalize_optional, DiaryRecord};
use pet_diary_core::ports::{DiaryStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-backed store that implements the `DiaryStore` port.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a new `JsonFileStore` persisting to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

//=========================================================================================
// "Impure" Stored Record Structs
//=========================================================================================

/// The wire shape of one record inside the JSON document. Timestamps are
/// kept textual here so a single corrupt value cannot abort a whole read.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDiaryRecord {
    id: Uuid,
    author: String,
    #[serde(default)]
    pet_name: String,
    image_url: String,
    created_at: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pet_characteristics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_person_pronoun: Option<String>,
}

impl StoredDiaryRecord {
    fn to_domain(self) -> DiaryRecord {
        let created_at = match DateTime::parse_from_rfc3339(&self.created_at) {
            Ok(parsed) => parsed.with_timezone(&Utc),
            Err(e) => {
                warn!(
                    "record {} has an unparsable createdAt '{}' ({}); substituting now",
                    self.id, self.created_at, e
                );
                Utc::now()
            }
        };

        DiaryRecord {
            id: self.id,
            author: self.author,
            pet_name: self.pet_name,
            image_url: self.image_url,
            created_at,
            content: self.content,
            pet_characteristics: normalize_optional(self.pet_characteristics),
            first_person_pronoun: normalize_optional(self.first_person_pronoun),
        }
    }

    fn from_domain(record: &DiaryRecord) -> Self {
        Self {
            id: record.id,
            author: record.author.clone(),
            pet_name: record.pet_name.clone(),
            image_url: record.image_url.clone(),
            created_at: record.created_at.to_rfc3339(),
            content: record.content.clone(),
            pet_characteristics: record.pet_characteristics.clone(),
            first_person_pronoun: record.first_person_pronoun.clone(),
        }
    }
}

//=========================================================================================
// `DiaryStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DiaryStore for JsonFileStore {
    /// Reads the whole collection. A missing file is an empty collection.
    async fn read_all(&self) -> PortResult<Vec<DiaryRecord>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PortError::Unexpected(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let stored: Vec<StoredDiaryRecord> = serde_json::from_slice(&raw).map_err(|e| {
            PortError::Unexpected(format!(
                "failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(stored.into_iter().map(StoredDiaryRecord::to_domain).collect())
    }

    /// Replaces the whole collection: serialize to a temp file in the same
    /// directory, then rename over the target so readers never observe a
    /// half-written document.
    async fn write_all(&self, records: &[DiaryRecord]) -> PortResult<()> {
        let stored: Vec<StoredDiaryRecord> =
            records.iter().map(StoredDiaryRecord::from_domain).collect();
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| PortError::Unexpected(format!("failed to serialize records: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                PortError::Unexpected(format!(
                    "failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(|e| {
                PortError::Unexpected(format!("failed to write {}: {}", tmp_path.display(), e))
            })?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            PortError::Unexpected(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (JsonFileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("diaries.json");
        (JsonFileStore::new(path), temp_dir)
    }

    fn sample_record(author: &str) -> DiaryRecord {
        DiaryRecord {
            id: Uuid::new_v4(),
            author: author.to_string(),
            pet_name: "ポチ".to_string(),
            image_url: "/uploads/abc/pet.png".to_string(),
            created_at: Utc::now(),
            content: "きょうは おさんぽを した。".to_string(),
            pet_characteristics: Some("元気いっぱい".to_string()),
            first_person_pronoun: None,
        }
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty_collection() {
        let (store, _temp) = create_test_store();
        let records = store.read_all().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn round_trip_preserves_records() {
        let (store, _temp) = create_test_store();

        let written: Vec<DiaryRecord> = (0..3).map(|i| sample_record(&format!("owner-{}", i))).collect();
        store.write_all(&written).await.unwrap();

        let read = store.read_all().await.unwrap();
        assert_eq!(read.len(), 3);
        for (w, r) in written.iter().zip(read.iter()) {
            assert_eq!(w.id, r.id);
            assert_eq!(w.author, r.author);
            assert_eq!(w.image_url, r.image_url);
            assert_eq!(w.content, r.content);
            // RFC 3339 keeps sub-second precision, so the timestamp survives
            // to (well past) the millisecond.
            assert_eq!(w.created_at.timestamp_millis(), r.created_at.timestamp_millis());
        }
    }

    #[tokio::test]
    async fn write_replaces_the_whole_collection() {
        let (store, _temp) = create_test_store();

        store
            .write_all(&[sample_record("a"), sample_record("b")])
            .await
            .unwrap();
        store.write_all(&[sample_record("c")]).await.unwrap();

        let read = store.read_all().await.unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].author, "c");
    }

    #[tokio::test]
    async fn unset_optional_fields_are_absent_from_the_document() {
        let (store, temp) = create_test_store();

        let mut record = sample_record("a");
        record.pet_characteristics = None;
        record.first_person_pronoun = None;
        store.write_all(&[record]).await.unwrap();

        let raw = std::fs::read_to_string(temp.path().join("diaries.json")).unwrap();
        assert!(!raw.contains("petCharacteristics"));
        assert!(!raw.contains("firstPersonPronoun"));
    }

    #[tokio::test]
    async fn corrupt_timestamp_is_tolerated() {
        let (store, temp) = create_test_store();

        let doc = format!(
            r#"[{{"id":"{}","author":"a","petName":"ポチ","imageUrl":"/uploads/x/pet.png","createdAt":"not-a-date","content":"こんにちは"}}]"#,
            Uuid::new_v4()
        );
        std::fs::write(temp.path().join("diaries.json"), doc).unwrap();

        let read = store.read_all().await.unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].content, "こんにちは");
        // The substituted timestamp is recent, not some epoch default.
        assert!((Utc::now() - read[0].created_at).num_seconds() < 5);
    }

    #[tokio::test]
    async fn invalid_json_is_a_storage_error() {
        let (store, temp) = create_test_store();
        std::fs::write(temp.path().join("diaries.json"), "{ not json").unwrap();

        assert!(store.read_all().await.is_err());
    }

    #[tokio::test]
    async fn blank_stored_optionals_normalize_to_unset() {
        let (store, temp) = create_test_store();

        let doc = format!(
            r#"[{{"id":"{}","author":"a","imageUrl":"/uploads/x/pet.png","createdAt":"{}","content":"x","petCharacteristics":"  ","firstPersonPronoun":""}}]"#,
            Uuid::new_v4(),
            Utc::now().to_rfc3339()
        );
        std::fs::write(temp.path().join("diaries.json"), doc).unwrap();

        let read = store.read_all().await.unwrap();
        assert_eq!(read[0].pet_characteristics, None);
        assert_eq!(read[0].first_person_pronoun, None);
    }
}
