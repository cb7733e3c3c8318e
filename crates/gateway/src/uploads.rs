//! Local filesystem storage for uploaded room avatars and chat images.

use palaver_config::StorageConfig;
use palaver_database::entities::room::DEFAULT_ROOM_AVATAR;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{GatewayError, GatewayResult};

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Filesystem-backed store for avatar and upload files.
#[derive(Clone)]
pub struct AvatarStore {
    root: PathBuf,
    avatar_dir: PathBuf,
    upload_dir: PathBuf,
    max_bytes: u64,
}

impl AvatarStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
            avatar_dir: config.room_avatar_dir(),
            upload_dir: config.upload_dir(),
            max_bytes: config.max_upload_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Lower-cased extension of an uploaded file name, when it is one of
    /// the accepted image formats.
    pub fn accepted_extension(file_name: &str) -> Option<String> {
        let ext = Path::new(file_name).extension()?.to_str()?.to_lowercase();
        ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
    }

    /// Persist an uploaded room avatar under a fresh name, returning the
    /// stored file name.
    pub async fn save_room_avatar(
        &self,
        original_name: &str,
        bytes: &[u8],
    ) -> GatewayResult<String> {
        let ext = Self::accepted_extension(original_name).ok_or_else(|| {
            GatewayError::InvalidRequest(format!(
                "unsupported avatar file type: {original_name}"
            ))
        })?;

        if bytes.len() as u64 > self.max_bytes {
            return Err(GatewayError::InvalidRequest(
                "avatar file exceeds the upload size limit".to_string(),
            ));
        }

        fs::create_dir_all(&self.avatar_dir)
            .await
            .map_err(|e| GatewayError::StorageError(e.to_string()))?;

        let file_name = format!("{}.{ext}", Uuid::new_v4());
        let path = self.avatar_dir.join(&file_name);
        fs::write(&path, bytes)
            .await
            .map_err(|e| GatewayError::StorageError(e.to_string()))?;

        debug!(path = %path.display(), "stored room avatar");
        Ok(file_name)
    }

    /// Remove a stored room avatar. The default avatar is shared and never
    /// deleted; missing files are not an error.
    pub async fn remove_room_avatar(&self, file_name: &str) {
        if file_name == DEFAULT_ROOM_AVATAR {
            return;
        }
        Self::remove_file(&self.avatar_dir, file_name).await;
    }

    /// Remove an uploaded chat image file.
    pub async fn remove_upload(&self, file_name: &str) {
        Self::remove_file(&self.upload_dir, file_name).await;
    }

    async fn remove_file(dir: &Path, file_name: &str) {
        // Only the final path component: uploaded names must never escape
        // the storage directory.
        let Some(name) = Path::new(file_name).file_name() else {
            return;
        };

        let path = dir.join(name);
        match fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "removed stored file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stored file"),
        }
    }
}
