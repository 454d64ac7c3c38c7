//! Local-disk object storage. Objects land in `UPLOAD_DIR` under a UUID
//! filename and are served statically, so the returned URL stays valid for
//! as long as the file exists.

use std::path::{Path, PathBuf};

use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
};

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub struct StoredObject {
    pub file_name: String,
    pub public_url: String,
}

fn extension_of(original_name: &str) -> Option<&str> {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
}

fn object_path(config: &AppConfig, file_name: &str) -> PathBuf {
    Path::new(&config.upload_dir).join(file_name)
}

pub async fn store_object(
    config: &AppConfig,
    original_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> AppResult<StoredObject> {
    if !content_type.starts_with("image/") {
        return Err(AppError::BadRequest(
            "only image uploads are accepted".into(),
        ));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest("file exceeds 5 MiB limit".into()));
    }

    let file_name = match extension_of(original_name) {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
        None => Uuid::new_v4().to_string(),
    };

    fs::create_dir_all(&config.upload_dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    let path = object_path(config, &file_name);
    let mut file = fs::File::create(&path)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    file.write_all(bytes)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    Ok(StoredObject {
        public_url: format!("{}/uploads/{}", config.public_base_url, file_name),
        file_name,
    })
}

pub async fn delete_object(config: &AppConfig, file_name: &str) -> AppResult<()> {
    // A path separator in the name would escape the upload directory.
    if file_name.contains('/') || file_name.contains("..") {
        return Err(AppError::BadRequest("invalid object name".into()));
    }

    let path = object_path(config, file_name);
    match fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound),
        Err(e) => Err(AppError::Internal(anyhow::anyhow!(e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(upload_dir: &str) -> AppConfig {
        AppConfig {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 0,
            upload_dir: upload_dir.into(),
            public_base_url: "http://localhost".into(),
        }
    }

    #[tokio::test]
    async fn rejects_non_image_content_types() {
        let config = test_config("does-not-exist");
        let result = store_object(&config, "notes.txt", "text/plain", b"hello").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn rejects_oversized_files() {
        let config = test_config("does-not-exist");
        let bytes = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let result = store_object(&config, "big.jpg", "image/jpeg", &bytes).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn delete_rejects_path_traversal() {
        let config = test_config("does-not-exist");
        let result = delete_object(&config, "../etc/passwd").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn stored_object_gets_a_public_url() {
        let dir = std::env::temp_dir().join(format!("nona-uploads-{}", Uuid::new_v4()));
        let config = test_config(dir.to_str().unwrap());
        let stored = store_object(&config, "scarf.jpg", "image/jpeg", b"fake image bytes")
            .await
            .unwrap();
        assert!(stored.file_name.ends_with(".jpg"));
        assert_eq!(
            stored.public_url,
            format!("http://localhost/uploads/{}", stored.file_name)
        );
        assert!(dir.join(&stored.file_name).exists());

        delete_object(&config, &stored.file_name).await.unwrap();
        assert!(matches!(
            delete_object(&config, &stored.file_name).await,
            Err(AppError::NotFound)
        ));
        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
