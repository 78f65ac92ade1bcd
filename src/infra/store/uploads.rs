//! Image uploads to the managed store's object storage.
//!
//! Image replacement is a two-step caller flow: the binary lands here
//! first, and the returned public URL goes into the post patch afterwards.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::repos::{ImageStorage, RepoError};

use super::RestStore;

/// File extension for the supported image content types.
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[async_trait]
impl ImageStorage for RestStore {
    /// Store an image in the configured bucket and return its public URL.
    async fn upload_image(
        &self,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, RepoError> {
        let Some(backend) = self.backend("upload_image") else {
            return Err(RepoError::Unconfigured);
        };

        let extension = extension_for(content_type).ok_or_else(|| {
            RepoError::invalid_input(format!("unsupported image content type `{content_type}`"))
        })?;

        let object_path = format!(
            "{}/{}.{extension}",
            Utc::now().format("%Y/%m"),
            Uuid::new_v4()
        );
        let upload_url = backend
            .base
            .join(&format!(
                "storage/v1/object/{}/{object_path}",
                backend.upload_bucket
            ))
            .map_err(RepoError::from_persistence)?;

        let response = backend
            .authed(
                backend
                    .client
                    .post(upload_url)
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .body(bytes),
            )
            .send()
            .await
            .map_err(RepoError::from_persistence)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RepoError::Persistence(format!(
                "image upload failed with status {status}: {}",
                detail.trim()
            )));
        }

        let public_url = backend
            .base
            .join(&format!(
                "storage/v1/object/public/{}/{object_path}",
                backend.upload_bucket
            ))
            .map_err(RepoError::from_persistence)?;

        Ok(public_url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_image_content_types_are_accepted() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("application/pdf"), None);
        assert_eq!(extension_for("text/html"), None);
    }
}
