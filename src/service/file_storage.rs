// service/file_storage.rs
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::service::error::ServiceError;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &[
    // documents
    "pdf", "doc", "docx", "txt", "rtf", "odt", "pages", "ppt", "pptx", "odp", "key", "xls", "xlsx",
    "ods", "csv",
    // images and design
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "svg", "webp", "ico", "psd", "ai", "xd",
    "fig", "sketch", "indd",
    // audio and video
    "mp4", "avi", "mov", "wmv", "flv", "mkv", "webm", "m4v", "mpg", "mpeg", "3gp", "mp3", "wav",
    "aac", "flac", "ogg", "m4a", "wma",
    // archives
    "zip", "rar", "7z", "tar", "gz", "bz2",
    // source
    "html", "css", "js", "py", "java", "cpp", "c", "cs", "php", "rb", "go", "rs", "json", "xml",
    "yml", "yaml", "sql",
];

/// Opaque blob storage used for deliverable files.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ServiceError>;

    async fn retrieve(&self, token: &str) -> Result<Vec<u8>, ServiceError>;

    async fn delete(&self, token: &str) -> Result<(), ServiceError>;
}

/// Lower-cased extension if it is on the allow-list.
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Keeps ascii alphanumerics, dots, dashes and underscores.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    /// Tokens are generated here, so anything with a path separator or a
    /// leading dot did not come from `store`.
    fn path_for(&self, token: &str) -> Result<PathBuf, ServiceError> {
        if token.is_empty()
            || token.starts_with('.')
            || token.contains(['/', '\\'])
            || Path::new(token).components().count() != 1
        {
            return Err(ServiceError::not_found("File not found"));
        }
        Ok(self.root.join(token))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::validation("Uploaded file is empty"));
        }
        if bytes.len() > self.max_bytes {
            return Err(ServiceError::validation(format!(
                "File exceeds the {} MB limit",
                self.max_bytes / (1024 * 1024)
            )));
        }
        if allowed_extension(file_name).is_none() {
            return Err(ServiceError::validation("File type is not allowed"));
        }

        let token = format!("{}_{}", Uuid::new_v4().simple(), sanitize_file_name(file_name));

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        fs::write(self.root.join(&token), &bytes)
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        tracing::debug!("Stored {} bytes as {}", bytes.len(), token);
        Ok(token)
    }

    async fn retrieve(&self, token: &str) -> Result<Vec<u8>, ServiceError> {
        let path = self.path_for(token)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ServiceError::not_found("File not found"))
            }
            Err(e) => Err(ServiceError::Storage(e.to_string())),
        }
    }

    async fn delete(&self, token: &str) -> Result<(), ServiceError> {
        let path = self.path_for(token)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServiceError::Storage(e.to_string())),
        }
    }
}
