//! crates/pet_diary_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like file storage or APIs.

use async_trait::async_trait;

use crate::domain::{DiaryRecord, StoredImage};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., filesystem, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Diary generation failed: {0}")]
    Generation(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for the full collection of diary records.
///
/// There are no row-level operations: callers read the whole collection,
/// mutate an in-memory copy, and write the whole collection back.
#[async_trait]
pub trait DiaryStore: Send + Sync {
    /// Returns every persisted record. Absent underlying storage is an
    /// empty collection, not an error.
    async fn read_all(&self) -> PortResult<Vec<DiaryRecord>>;

    /// Replaces the entire persisted collection.
    async fn write_all(&self, records: &[DiaryRecord]) -> PortResult<()>;
}

/// Requests diary text from an external LLM.
#[async_trait]
pub trait DiaryGenerationService: Send + Sync {
    /// Generates diary text from an instruction prompt plus the pet's photo.
    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> PortResult<String>;

    /// Text-only variant for flows where no image is available.
    async fn generate(&self, prompt: &str) -> PortResult<String>;
}

/// Storage for uploaded pet photos.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores decoded image bytes under a freshly generated id and returns
    /// the public path the image is served from.
    async fn store(&self, image: &[u8], filename: Option<&str>) -> PortResult<StoredImage>;

    /// Resolves a previously returned public path back to the stored bytes.
    /// External URLs and unknown paths resolve to `None`.
    async fn load(&self, image_url: &str) -> PortResult<Option<Vec<u8>>>;
}
