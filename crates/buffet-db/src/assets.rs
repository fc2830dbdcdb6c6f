//! # Asset Store
//!
//! Image blobs that belong to catalog items.
//!
//! ## Naming
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Asset Name Generation                                │
//! │                                                                         │
//! │  Uploaded as: "C:\photos\khachapuri.png"                               │
//! │       │                                                                 │
//! │       ▼  basename (both / and \ are separators)                        │
//! │  "khachapuri.png"                                                      │
//! │       │                                                                 │
//! │       ▼  prefix with local time, second resolution                     │
//! │  "20240315_184502_khachapuri.png"                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  <asset dir>/20240315_184502_khachapuri.png   served as /img/<name>    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Blobs are opened with create-new semantics: two uploads of the same file
//! name within one second make the second write fail instead of replacing a
//! blob another item still references.

use chrono::{DateTime, Local};
use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::AssetError;

/// Basename used when the uploaded name has none.
const FALLBACK_BASENAME: &str = "image";

/// Public URL prefix assets are served under.
pub const DEFAULT_PUBLIC_PREFIX: &str = "/img";

// =============================================================================
// Upload
// =============================================================================

/// An image on its way into the asset store.
pub struct ImageUpload {
    /// Name as supplied by the user; only its basename survives.
    pub original_name: String,
    /// Blob content.
    pub content: Box<dyn AsyncRead + Send + Unpin>,
}

impl ImageUpload {
    /// Creates an upload from any async reader.
    pub fn new(original_name: impl Into<String>, content: impl AsyncRead + Send + Unpin + 'static) -> Self {
        ImageUpload {
            original_name: original_name.into(),
            content: Box::new(content),
        }
    }

    /// Creates an upload from an in-memory buffer.
    pub fn from_bytes(original_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        ImageUpload::new(original_name, io::Cursor::new(bytes.into()))
    }

    /// Opens a local file as an upload.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path).await?;
        Ok(ImageUpload::new(path.to_string_lossy(), file))
    }
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("original_name", &self.original_name)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Store Contract
// =============================================================================

/// Where item images live.
///
/// The item repository drives this contract; it never touches the
/// filesystem itself.
pub trait AssetStore: Send + Sync {
    /// Persists the upload and returns the generated asset name.
    ///
    /// A failed write leaves nothing behind.
    fn write(&self, upload: ImageUpload) -> impl Future<Output = Result<String, AssetError>> + Send;

    /// Removes a previously written asset.
    fn remove(&self, name: &str) -> impl Future<Output = Result<(), AssetError>> + Send;
}

/// Reduces a user-supplied file name to a safe basename.
///
/// ## Example
/// ```rust
/// use buffet_db::assets::sanitize_basename;
///
/// assert_eq!(sanitize_basename("../../etc/passwd"), "passwd");
/// assert_eq!(sanitize_basename("C:\\photos\\lobio.jpg"), "lobio.jpg");
/// assert_eq!(sanitize_basename(".."), "image");
/// ```
pub fn sanitize_basename(original: &str) -> &str {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    match base {
        "" | "." | ".." => FALLBACK_BASENAME,
        base => base,
    }
}

/// Builds the asset name for an upload made at `at`.
pub fn asset_name(at: DateTime<Local>, original: &str) -> String {
    format!("{}_{}", at.format("%Y%m%d_%H%M%S"), sanitize_basename(original))
}

// =============================================================================
// Filesystem Store
// =============================================================================

/// Asset store backed by a local directory.
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    dir: PathBuf,
    public_prefix: String,
}

impl FsAssetStore {
    /// Creates a store rooted at `dir`, served under `/img`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FsAssetStore {
            dir: dir.into(),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
        }
    }

    /// Sets the public URL prefix.
    pub fn public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_prefix = prefix.into();
        self
    }

    /// Returns the asset directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the asset directory if it doesn't exist.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Public URL path of an asset, e.g. `/img/20240315_184502_lobio.jpg`.
    pub fn public_path(&self, name: &str) -> String {
        format!("{}/{}", self.public_prefix.trim_end_matches('/'), name)
    }

    async fn write_as(&self, name: String, mut upload: ImageUpload) -> Result<String, AssetError> {
        let path = self.dir.join(&name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|source| AssetError::WriteFailed {
                name: name.clone(),
                source,
            })?;

        let copied = async {
            let bytes = tokio::io::copy(&mut upload.content, &mut file).await?;
            file.flush().await?;
            Ok::<_, io::Error>(bytes)
        }
        .await;

        match copied {
            Ok(bytes) => {
                debug!(asset = %name, bytes, "Asset written");
                Ok(name)
            }
            Err(source) => {
                drop(file);
                if let Err(e) = fs::remove_file(&path).await {
                    warn!(asset = %name, error = %e, "Failed to remove partial asset");
                }
                Err(AssetError::WriteFailed { name, source })
            }
        }
    }
}

impl AssetStore for FsAssetStore {
    async fn write(&self, upload: ImageUpload) -> Result<String, AssetError> {
        let name = asset_name(Local::now(), &upload.original_name);
        self.write_as(name, upload).await
    }

    async fn remove(&self, name: &str) -> Result<(), AssetError> {
        if sanitize_basename(name) != name {
            return Err(AssetError::RemoveFailed {
                name: name.to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a plain asset name"),
            });
        }

        fs::remove_file(self.dir.join(name))
            .await
            .map_err(|source| AssetError::RemoveFailed {
                name: name.to_string(),
                source,
            })?;

        debug!(asset = %name, "Asset removed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncReadExt, ReadBuf};

    /// Yields a few bytes, then fails.
    struct BrokenReader {
        sent: bool,
    }

    impl AsyncRead for BrokenReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.sent {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "upload aborted")));
            }
            self.sent = true;
            buf.put_slice(b"partial");
            Poll::Ready(Ok(()))
        }
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_sanitize_basename() {
        assert_eq!(sanitize_basename("lobio.jpg"), "lobio.jpg");
        assert_eq!(sanitize_basename("/tmp/up/lobio.jpg"), "lobio.jpg");
        assert_eq!(sanitize_basename("a\\b/c\\d.png"), "d.png");
        assert_eq!(sanitize_basename("dir/"), "image");
        assert_eq!(sanitize_basename(""), "image");
        assert_eq!(sanitize_basename("."), "image");
        assert_eq!(sanitize_basename("x/.."), "image");
    }

    #[test]
    fn test_asset_name_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 15, 18, 45, 2).unwrap();
        assert_eq!(
            asset_name(at, "photos/khachapuri.png"),
            "20240315_184502_khachapuri.png"
        );
    }

    #[test]
    fn test_public_path() {
        let store = FsAssetStore::new("img");
        assert_eq!(store.public_path("a.png"), "/img/a.png");

        let store = FsAssetStore::new("img").public_prefix("/static/");
        assert_eq!(store.public_path("a.png"), "/static/a.png");
    }

    #[tokio::test]
    async fn test_write_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(dir.path());

        let name = store
            .write(ImageUpload::from_bytes("../uploads/lobio.jpg", b"jpeg bytes".to_vec()))
            .await
            .unwrap();

        assert!(name.ends_with("_lobio.jpg"));
        assert_eq!(name.len(), "YYYYMMDD_HHMMSS_lobio.jpg".len());

        let mut stored = String::new();
        fs::File::open(dir.path().join(&name))
            .await
            .unwrap()
            .read_to_string(&mut stored)
            .await
            .unwrap();
        assert_eq!(stored, "jpeg bytes");

        store.remove(&name).await.unwrap();
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_write_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(dir.path());
        let name = "20240315_184502_lobio.jpg".to_string();

        store
            .write_as(name.clone(), ImageUpload::from_bytes("lobio.jpg", b"first".to_vec()))
            .await
            .unwrap();
        let err = store
            .write_as(name.clone(), ImageUpload::from_bytes("lobio.jpg", b"second".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, AssetError::WriteFailed { .. }));
        assert_eq!(std::fs::read(dir.path().join(&name)).unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_failed_copy_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(dir.path());

        let err = store
            .write(ImageUpload::new("broken.png", BrokenReader { sent: false }))
            .await
            .unwrap_err();

        assert!(matches!(err, AssetError::WriteFailed { .. }));
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_write_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(dir.path().join("missing"));

        let err = store
            .write(ImageUpload::from_bytes("a.png", b"x".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::WriteFailed { .. }));

        store.ensure_dir().await.unwrap();
        assert!(store
            .write(ImageUpload::from_bytes("a.png", b"x".to_vec()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_remove_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(dir.path());

        assert!(matches!(
            store.remove("20240101_000000_gone.png").await,
            Err(AssetError::RemoveFailed { .. })
        ));
        assert!(matches!(
            store.remove("../outside.png").await,
            Err(AssetError::RemoveFailed { .. })
        ));
    }
}
