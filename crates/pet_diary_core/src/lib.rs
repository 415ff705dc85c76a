pub mod domain;
pub mod persona;
pub mod ports;
pub mod prompt;

pub use domain::{normalize_optional, DiaryRecord, StoredImage};
pub use persona::{PersonaCache, SavedPersona};
pub use ports::{DiaryGenerationService, DiaryStore, ImageStore, PortError, PortResult};
pub use prompt::{build_prompt, DEFAULT_FIRST_PERSON};
