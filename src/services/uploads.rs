use crate::errors::ServiceError;
use chrono::Utc;
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{info, instrument, warn};

/// Accepted image types and the extension stored files get for each.
const ALLOWED_IMAGE_TYPES: [(&str, &str); 4] = [
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
];

pub const FILENAME_PREFIX: &str = "product-image";

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub filename: String,
    pub path: PathBuf,
}

/// Writes product images to a public directory. Keeps no database record.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Extension for an accepted MIME type, `None` for anything else.
    pub fn extension_for(content_type: &str) -> Option<&'static str> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        ALLOWED_IMAGE_TYPES
            .iter()
            .find(|(mime, _)| *mime == essence)
            .map(|(_, ext)| *ext)
    }

    pub fn check_type(content_type: Option<&str>) -> Result<&'static str, ServiceError> {
        content_type
            .and_then(Self::extension_for)
            .ok_or_else(|| {
                ServiceError::BadRequest(
                    "Invalid file type. Only JPEG, PNG, GIF and WebP are allowed.".to_string(),
                )
            })
    }

    pub fn too_large_error(&self) -> ServiceError {
        ServiceError::BadRequest(format!(
            "File too large. Maximum size is {} MB.",
            self.max_bytes / (1024 * 1024)
        ))
    }

    /// `product-image-{unix millis}-{random below 10^9}{ext}`
    pub fn generate_filename(extension: &str) -> String {
        let millis = Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        format!("{}-{}-{}{}", FILENAME_PREFIX, millis, suffix, extension)
    }

    /// Persists an already size- and type-checked image.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn store(&self, extension: &str, bytes: &[u8]) -> Result<StoredImage, ServiceError> {
        if bytes.len() > self.max_bytes {
            return Err(self.too_large_error());
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let filename = Self::generate_filename(extension);
        let path = self.dir.join(&filename);

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        write_or_discard(file, &path, bytes).await?;

        info!(filename = %filename, "Stored uploaded image");
        Ok(StoredImage { filename, path })
    }
}

/// Writes `bytes` to the freshly created `path`, removing it again when the
/// write fails so no partial image is left behind.
async fn write_or_discard<W>(mut file: W, path: &Path, bytes: &[u8]) -> Result<(), ServiceError>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;
    if let Err(e) = written {
        drop(file);
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %remove_err, "Failed to remove partial upload");
        }
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::TempDir;

    /// Writer whose disk is always full
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "no space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn only_four_image_types_are_accepted() {
        assert_eq!(ImageStore::extension_for("image/jpeg"), Some(".jpg"));
        assert_eq!(ImageStore::extension_for("image/PNG"), Some(".png"));
        assert_eq!(ImageStore::extension_for("image/webp; q=1"), Some(".webp"));
        assert_eq!(ImageStore::extension_for("image/svg+xml"), None);
        assert_eq!(ImageStore::extension_for("application/pdf"), None);
        assert_matches!(ImageStore::check_type(None), Err(ServiceError::BadRequest(_)));
    }

    #[test]
    fn generated_names_follow_pattern_and_differ() {
        let a = ImageStore::generate_filename(".png");
        let b = ImageStore::generate_filename(".png");
        assert!(a.starts_with("product-image-"));
        assert!(a.ends_with(".png"));
        assert_eq!(a.trim_end_matches(".png").split('-').count(), 4);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn store_writes_file_under_dir() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path().join("uploads"), 1024);
        let stored = store.store(".gif", b"GIF89a").await.unwrap();
        assert!(stored.path.starts_with(dir.path()));
        assert_eq!(tokio::fs::read(&stored.path).await.unwrap(), b"GIF89a");
    }

    #[tokio::test]
    async fn store_refuses_oversize_without_writing() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path(), 4);
        let err = store.store(".png", b"too many bytes").await.unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(_));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_write_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("product-image-1-2.png");
        tokio::fs::write(&path, b"\x89PN").await.unwrap();

        let err = write_or_discard(FullDisk, &path, b"\x89PNG\r\n").await.unwrap_err();
        assert_matches!(err, ServiceError::Io(_));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
