//! Filesystem-backed asset store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::ImageFormat;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::{AssetStore, UploadError};
use crate::constants::IMAGE_ROUTE;

/// Writes images to `<root>/<owner>/<item>.<ext>` and references them by URL
/// under the server's image route.
#[derive(Clone, Debug)]
pub struct LocalAssetStore {
    root: PathBuf,
    public_base: Url,
}

impl LocalAssetStore {
    /// `public_base` is the externally visible URL of the server, eg `https://example.org/`.
    pub fn new(root: &Path, public_base: &str) -> Result<Self, UploadError> {
        let mut public_base = Url::parse(public_base)?;
        if !public_base.path().ends_with('/') {
            let path = format!("{}/", public_base.path());
            public_base.set_path(&path);
        }
        Ok(Self {
            root: root.to_path_buf(),
            public_base,
        })
    }

    /// Directory images are written under.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn extension_for(bytes: &[u8]) -> Result<&'static str, UploadError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => Ok("png"),
        Ok(ImageFormat::Jpeg) => Ok("jpg"),
        Ok(ImageFormat::WebP) => Ok("webp"),
        _ => Err(UploadError::UnsupportedFormat),
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn upload(
        &self,
        owner_id: &str,
        item_id: &Uuid,
        bytes: &[u8],
    ) -> Result<String, UploadError> {
        if !is_safe_segment(owner_id) {
            return Err(UploadError::InvalidReference(format!(
                "owner id {owner_id:?} is not a safe path segment"
            )));
        }
        let extension = extension_for(bytes)?;
        let filename = format!("{item_id}.{extension}");

        let dir = self.root.join(owner_id);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes).await?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());

        let url = self
            .public_base
            .join(&format!("{IMAGE_ROUTE}/{owner_id}/{filename}"))?;
        Ok(url.to_string())
    }
}
