//! crates/pet_diary_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One persisted diary entry: the uploaded photo plus the generated
/// (or later edited) diary text and its metadata.
///
/// `id` and `author` are fixed at creation and never change afterwards.
#[derive(Debug, Clone)]
pub struct DiaryRecord {
    pub id: Uuid,
    pub author: String,
    /// Empty string means the pet was not given a name.
    pub pet_name: String,
    /// Absolute URL or site-relative path to the photo.
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
    /// `None` is "unset"; blank strings are normalized away before storage.
    pub pet_characteristics: Option<String>,
    /// `None` means "use the default pronoun" at prompt-build time.
    pub first_person_pronoun: Option<String>,
}

/// The result of ingesting an uploaded image.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub id: Uuid,
    /// Site-relative public path to the stored file.
    pub public_url: String,
}

/// Normalizes an optional free-text field: trims whitespace and maps
/// blank values to `None`, so "unset" has a single representation.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_optional_maps_blank_to_none() {
        assert_eq!(normalize_optional(None), None);
        assert_eq!(normalize_optional(Some("".to_string())), None);
        assert_eq!(normalize_optional(Some("   \n".to_string())), None);
    }

    #[test]
    fn normalize_optional_trims_values() {
        assert_eq!(
            normalize_optional(Some("  ふわふわ  ".to_string())),
            Some("ふわふわ".to_string())
        );
    }
}
