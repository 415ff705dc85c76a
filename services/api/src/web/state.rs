//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use pet_diary_core::ports::{DiaryGenerationService, DiaryStore, ImageStore};

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub store: Arc<dyn DiaryStore>,
    pub generator: Arc<dyn DiaryGenerationService>,
    pub images: Arc<dyn ImageStore>,
    pub config: Arc<Config>,
    /// Serializes every read-modify-write sequence against the store.
    /// The store itself is a whole-file replace with no row locking, so two
    /// racing mutations would otherwise silently lose one write.
    pub store_write_lock: Mutex<()>,
}
