//! Image storage for ijara.
//!
//! Uploaded images are stored under a generated hashcode, never under the
//! client's filename:
//! ```text
//! {base_path}/
//! ├── 3f/
//! │   └── 3f2a9c0e41d84b7a9d0e5c1b2a3f4e5d.jpg
//! └── a0/
//!     └── a04b...png
//! ```
//! The shard directory is the first two characters of the hashcode.

use std::io;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::{IjaraError, Result};

/// Extensions accepted for uploads.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// A stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Public lookup key.
    pub hashcode: String,
    /// Path relative to the storage root (`{shard}/{hashcode}.{ext}`).
    pub url: String,
}

/// Sharded on-disk image store.
#[derive(Debug, Clone)]
pub struct ImageStorage {
    base_path: PathBuf,
    max_size: usize,
}

impl ImageStorage {
    /// Create a storage rooted at `base_path`, creating it when missing.
    pub fn new(base_path: impl Into<PathBuf>, max_size: usize) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Storage root.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Maximum accepted upload size in bytes.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Store `content` under a fresh hashcode.
    ///
    /// `original_name` only contributes its extension, which must be a
    /// known image type.
    pub async fn save(&self, content: &[u8], original_name: &str) -> Result<StoredImage> {
        if content.is_empty() {
            return Err(IjaraError::Validation("image is empty".to_string()));
        }
        if content.len() > self.max_size {
            return Err(IjaraError::Validation(format!(
                "image exceeds {} bytes",
                self.max_size
            )));
        }
        let ext = image_extension(original_name)?;

        let hashcode = Uuid::new_v4().simple().to_string();
        let url = format!("{}/{hashcode}.{ext}", &hashcode[..2]);
        let path = self.base_path.join(&url);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;

        Ok(StoredImage { hashcode, url })
    }

    /// Read a stored image.
    pub async fn load(&self, url: &str) -> Result<Vec<u8>> {
        let path = self.resolve(url)?;
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(IjaraError::NotFound(format!("image file {url}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a stored image. Returns false if it did not exist.
    pub async fn delete(&self, url: &str) -> Result<bool> {
        let path = self.resolve(url)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, url: &str) -> Result<PathBuf> {
        let relative = Path::new(url);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(IjaraError::Validation(format!("invalid image path: {url}")));
        }
        Ok(self.base_path.join(relative))
    }
}

/// Content type for a stored image path.
pub fn content_type(url: &str) -> String {
    mime_guess::from_path(url)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn image_extension(filename: &str) -> Result<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .ok_or_else(|| IjaraError::Validation("image file has no extension".to_string()))?;

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(IjaraError::Validation(format!(
            "unsupported image type: {ext}"
        )));
    }
    Ok(ext)
}
