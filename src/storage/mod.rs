//! Object storage backends
//!
//! One upload per request: the whole file body in a single call, no
//! chunking, no retry. The backend is chosen once at startup.

pub mod dropbox;
pub mod s3;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::core::config::StorageConfig;
use crate::core::error::AppError;

/// A storage backend the pipeline can push downloaded files to.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name used in replies and logs.
    fn name(&self) -> &'static str;

    /// Uploads the file at `local_path` in a single attempt and returns the
    /// remote object path.
    async fn upload_file(&self, local_path: &str) -> Result<String, AppError>;
}

/// Builds the configured backend.
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, AppError> {
    match config {
        StorageConfig::S3(s3_config) => Ok(Arc::new(s3::S3Store::new(s3_config)?)),
        StorageConfig::Dropbox(dropbox_config) => Ok(Arc::new(dropbox::DropboxStore::new(dropbox_config))),
    }
}

/// Derives the object name from the final path segment of `local_path`.
pub(crate) fn object_name(local_path: &str) -> Result<&str, AppError> {
    Path::new(local_path)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            AppError::Upload(format!(
                "unable to determine file name from path '{}'",
                local_path
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_is_the_final_segment() {
        assert_eq!(object_name("./downloads/clip.mp4").expect("has segment"), "clip.mp4");
        assert_eq!(object_name("clip.mp4").expect("has segment"), "clip.mp4");
        assert_eq!(
            object_name("/var/media/Some_Title.webm").expect("has segment"),
            "Some_Title.webm"
        );
    }

    #[test]
    fn pathological_paths_fail_fast() {
        assert!(object_name("").is_err());
        assert!(object_name("/").is_err());
        assert!(object_name("downloads/..").is_err());
    }
}
