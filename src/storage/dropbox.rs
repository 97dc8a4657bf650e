//! Dropbox backend
//!
//! One `files/upload` call per file, bearer-token auth. Uploaded files land
//! under `/videos/{filename}`.

use async_trait::async_trait;
use serde::Serialize;

use crate::core::config::DropboxConfig;
use crate::core::error::AppError;
use crate::storage::{object_name, ObjectStore};

const UPLOAD_URL: &str = "https://content.dropboxapi.com/2/files/upload";

/// All uploads land under this folder.
const PATH_PREFIX: &str = "/videos";

/// The `Dropbox-API-Arg` header payload for `files/upload`.
///
/// The header must stay ASCII; file names are ASCII already because the
/// downloader runs with `--restrict-filenames`.
#[derive(Serialize)]
struct UploadArg {
    path: String,
    mode: &'static str,
    autorename: bool,
    mute: bool,
}

pub struct DropboxStore {
    access_token: String,
    upload_url: String,
    client: reqwest::Client,
}

impl DropboxStore {
    pub fn new(config: &DropboxConfig) -> Self {
        Self::with_upload_url(config, UPLOAD_URL.to_string())
    }

    fn with_upload_url(config: &DropboxConfig, upload_url: String) -> Self {
        Self {
            access_token: config.access_token.clone(),
            upload_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ObjectStore for DropboxStore {
    fn name(&self) -> &'static str {
        "Dropbox"
    }

    async fn upload_file(&self, local_path: &str) -> Result<String, AppError> {
        let file_name = object_name(local_path)?;
        let remote_path = format!("{}/{}", PATH_PREFIX, file_name);

        let api_arg = serde_json::to_string(&UploadArg {
            path: remote_path.clone(),
            mode: "add",
            autorename: true,
            mute: false,
        })
        .map_err(|e| AppError::Upload(format!("failed to encode Dropbox-API-Arg: {}", e)))?;

        let body = tokio::fs::read(local_path).await?;
        log::info!("Uploading {} bytes to Dropbox at {}", body.len(), remote_path);

        let response = self
            .client
            .post(&self.upload_url)
            .bearer_auth(&self.access_token)
            .header("Dropbox-API-Arg", api_arg)
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(AppError::Upload(format!(
                "Dropbox upload returned status {}: {}",
                status,
                body_text.trim()
            )));
        }
        Ok(remote_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server_uri: &str) -> DropboxStore {
        DropboxStore::with_upload_url(
            &DropboxConfig {
                access_token: "sl.test-token".to_string(),
            },
            format!("{}/2/files/upload", server_uri),
        )
    }

    #[tokio::test]
    async fn uploads_under_videos_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/files/upload"))
            .and(header("Authorization", "Bearer sl.test-token"))
            .and(header("Content-Type", "application/octet-stream"))
            .and(header_exists("Dropbox-API-Arg"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let file_path = dir.path().join("clip.mp4");
        fs::write(&file_path, b"video bytes").expect("write fixture");

        let store = store_for(&server.uri());
        let remote = store
            .upload_file(file_path.to_str().expect("utf-8 path"))
            .await
            .expect("upload succeeds");
        assert_eq!(remote, "/videos/clip.mp4");
    }

    #[tokio::test]
    async fn error_status_surfaces_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/files/upload"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_access_token"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let file_path = dir.path().join("clip.mp4");
        fs::write(&file_path, b"video bytes").expect("write fixture");

        let store = store_for(&server.uri());
        let err = store
            .upload_file(file_path.to_str().expect("utf-8 path"))
            .await
            .expect_err("upload must fail");
        let message = err.to_string();
        assert!(message.contains("401"), "unexpected error: {}", message);
        assert!(message.contains("invalid_access_token"), "unexpected error: {}", message);
    }

    #[tokio::test]
    async fn missing_local_file_is_an_io_error() {
        let store = store_for("http://127.0.0.1:9");
        let err = store
            .upload_file("/nonexistent/clip.mp4")
            .await
            .expect_err("read must fail");
        assert!(matches!(err, AppError::Io(_)));
    }
}
