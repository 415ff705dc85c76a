//! services/api/src/adapters/image_store.rs
//!
//! Local-filesystem implementation of the `ImageStore` port. Each uploaded
//! photo lives in its own directory named by a generated id, so concurrent
//! uploads never write to the same path.

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use pet_diary_core::domain::StoredImage;
use pet_diary_core::ports::{ImageStore, PortError, PortResult};

/// The public prefix the upload root is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

const VALID_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A filesystem adapter that implements the `ImageStore` port.
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    /// Creates a new `LocalImageStore` rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

/// Picks the stored file's extension from the uploaded filename, falling
/// back to `png` for unrecognized or missing extensions.
fn file_extension(filename: Option<&str>) -> &'static str {
    let ext = filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some(ext) => VALID_EXTENSIONS
            .iter()
            .find(|valid| **valid == ext)
            .copied()
            .unwrap_or("png"),
        None => "png",
    }
}

//=========================================================================================
// `ImageStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, image: &[u8], filename: Option<&str>) -> PortResult<StoredImage> {
        let id = Uuid::new_v4();
        let ext = file_extension(filename);

        let image_dir = self.root.join(id.to_string());
        tokio::fs::create_dir_all(&image_dir).await.map_err(|e| {
            PortError::Unexpected(format!("failed to create {}: {}", image_dir.display(), e))
        })?;

        let file_name = format!("pet.{}", ext);
        let file_path = image_dir.join(&file_name);
        tokio::fs::write(&file_path, image).await.map_err(|e| {
            PortError::Unexpected(format!("failed to write {}: {}", file_path.display(), e))
        })?;

        Ok(StoredImage {
            id,
            public_url: format!("{}/{}/{}", PUBLIC_PREFIX, id, file_name),
        })
    }

    async fn load(&self, image_url: &str) -> PortResult<Option<Vec<u8>>> {
        // Only site-relative paths under the public prefix resolve to disk.
        let Some(relative) = image_url
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return Ok(None);
        };

        // Refuse anything that could escape the upload root.
        if relative
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Ok(None);
        }

        match tokio::fs::read(self.root.join(relative)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unexpected(format!(
                "failed to read stored image {}: {}",
                image_url, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (LocalImageStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        (LocalImageStore::new(temp_dir.path().to_path_buf()), temp_dir)
    }

    #[test]
    fn extension_comes_from_a_recognized_filename() {
        assert_eq!(file_extension(Some("photo.JPG")), "jpg");
        assert_eq!(file_extension(Some("photo.jpeg")), "jpeg");
        assert_eq!(file_extension(Some("photo.webp")), "webp");
    }

    #[test]
    fn unrecognized_extensions_fall_back_to_png() {
        assert_eq!(file_extension(None), "png");
        assert_eq!(file_extension(Some("photo")), "png");
        assert_eq!(file_extension(Some("photo.svg")), "png");
        assert_eq!(file_extension(Some("photo.txt")), "png");
    }

    #[tokio::test]
    async fn store_writes_into_a_per_id_directory() {
        let (store, temp) = create_test_store();

        let stored = store.store(b"fake-bytes", Some("pochi.jpg")).await.unwrap();
        assert_eq!(
            stored.public_url,
            format!("/uploads/{}/pet.jpg", stored.id)
        );

        let on_disk = temp.path().join(stored.id.to_string()).join("pet.jpg");
        assert_eq!(std::fs::read(on_disk).unwrap(), b"fake-bytes");
    }

    #[tokio::test]
    async fn load_round_trips_a_stored_image() {
        let (store, _temp) = create_test_store();

        let stored = store.store(b"round-trip", None).await.unwrap();
        let loaded = store.load(&stored.public_url).await.unwrap();
        assert_eq!(loaded.as_deref(), Some(&b"round-trip"[..]));
    }

    #[tokio::test]
    async fn external_and_unknown_urls_resolve_to_none() {
        let (store, _temp) = create_test_store();

        assert!(store
            .load("https://example.com/cat.png")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .load(&format!("/uploads/{}/pet.png", Uuid::new_v4()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn traversal_paths_are_refused() {
        let (store, _temp) = create_test_store();
        assert!(store
            .load("/uploads/../secrets.txt")
            .await
            .unwrap()
            .is_none());
        assert!(store.load("/uploads//etc/passwd").await.unwrap().is_none());
    }
}
