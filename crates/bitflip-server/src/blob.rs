//! Local blob store backing the upload/download API.
//!
//! Blobs are plain files in a single directory. Stored names are sanitised
//! and stamped with the upload time so repeated uploads never overwrite.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Blob store errors.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("No file part in request")]
    MissingFile,

    #[error("No file selected")]
    NoFileSelected,

    #[error("File type not allowed. Allowed types: {allowed}")]
    ExtensionNotAllowed { allowed: String },

    #[error("File too large: limit is {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Invalid filename: {0}")]
    InvalidName(String),

    #[error("File not found")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A freshly stored blob.
#[derive(Debug, Clone, Serialize)]
pub struct StoredBlob {
    pub filename: String,
    pub original_filename: String,
    pub size: u64,
    pub upload_time: DateTime<Local>,
}

/// Directory listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct BlobInfo {
    pub filename: String,
    pub size: u64,
    pub size_formatted: String,
    pub created: DateTime<Local>,
    pub modified: DateTime<Local>,
    pub download_url: String,
}

/// Files in one local directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    allowed_extensions: Vec<String>,
    max_bytes: usize,
}

impl BlobStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(
        root: impl Into<PathBuf>,
        allowed_extensions: Vec<String>,
        max_bytes: usize,
    ) -> Result<Self, BlobError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "Opened blob store");
        Ok(Self {
            root,
            allowed_extensions,
            max_bytes,
        })
    }

    /// Store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maximum accepted blob size in bytes.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Accepted extensions.
    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Whether `filename` carries an accepted extension.
    pub fn is_allowed(&self, filename: &str) -> bool {
        filename.rsplit_once('.').is_some_and(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            self.allowed_extensions.iter().any(|a| *a == ext)
        })
    }

    /// Store `data` under a sanitised, timestamped name.
    pub async fn store(&self, original: &str, data: &[u8]) -> Result<StoredBlob, BlobError> {
        if original.is_empty() {
            return Err(BlobError::NoFileSelected);
        }
        if !self.is_allowed(original) {
            return Err(BlobError::ExtensionNotAllowed {
                allowed: self.allowed_extensions.join(", "),
            });
        }
        if data.len() > self.max_bytes {
            return Err(BlobError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let safe = sanitize_filename(original)
            .ok_or_else(|| BlobError::InvalidName(original.to_string()))?;
        let (stem, ext) = safe
            .rsplit_once('.')
            .ok_or_else(|| BlobError::InvalidName(original.to_string()))?;

        let now = Local::now();
        let stamp = now.format("%Y%m%d_%H%M%S");

        let mut attempt = 0u32;
        let (filename, file) = loop {
            let candidate = if attempt == 0 {
                format!("{stem}_{stamp}.{ext}")
            } else {
                format!("{stem}_{stamp}_{attempt}.{ext}")
            };
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.root.join(&candidate))
                .await
            {
                Ok(file) => break (candidate, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        };

        write_or_discard(&self.root.join(&filename), file, data).await?;

        tracing::info!(filename = %filename, size = data.len(), "Stored blob");

        Ok(StoredBlob {
            filename,
            original_filename: original.to_string(),
            size: data.len() as u64,
            upload_time: now,
        })
    }

    /// Read a blob; returns the sanitised name and contents.
    pub async fn read(&self, filename: &str) -> Result<(String, Vec<u8>), BlobError> {
        let (name, path) = self.resolve(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok((name, bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(name)),
            Err(e) => Err(e.into()),
        }
    }

    /// List blobs, newest first.
    pub async fn list(&self) -> Result<Vec<BlobInfo>, BlobError> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().into_owned();
            let modified = metadata.modified()?;
            let created = metadata.created().unwrap_or(modified);

            files.push(BlobInfo {
                size: metadata.len(),
                size_formatted: format_size(metadata.len()),
                created: local_time(created),
                modified: local_time(modified),
                download_url: format!("/download/{filename}"),
                filename,
            });
        }

        files.sort_by(|a, b| {
            b.created
                .cmp(&a.created)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Ok(files)
    }

    /// Delete a blob; returns the sanitised name.
    pub async fn delete(&self, filename: &str) -> Result<String, BlobError> {
        let (name, path) = self.resolve(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(filename = %name, "Deleted blob");
                Ok(name)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(name)),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, filename: &str) -> Result<(String, PathBuf), BlobError> {
        let name =
            sanitize_filename(filename).ok_or_else(|| BlobError::NotFound(filename.to_string()))?;
        let path = self.root.join(&name);
        Ok((name, path))
    }
}

fn local_time(t: SystemTime) -> DateTime<Local> {
    DateTime::<Local>::from(t)
}

/// Reduce a client-supplied filename to a safe single path component.
///
/// Path separators and whitespace become `_`, anything outside
/// `[A-Za-z0-9._-]` is dropped, and leading/trailing dots and underscores
/// are stripped. Returns `None` when nothing is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let joined = name
        .split(|c: char| c == '/' || c == '\\' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Human-readable size in kilobytes.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

/// Write `data` to a freshly created blob file, removing it again on failure.
async fn write_or_discard<W>(path: &Path, mut writer: W, data: &[u8]) -> Result<(), BlobError>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(data).await?;
        writer.flush().await
    }
    .await;
    drop(writer);

    if let Err(e) = written {
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %cleanup, "Failed to remove partial blob");
        }
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> BlobStore {
        BlobStore::open(
            dir,
            vec!["txt".into(), "qasm".into(), "json".into()],
            1024,
        )
        .unwrap()
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.txt").as_deref(), Some("report.txt"));
        assert_eq!(
            sanitize_filename("my report v2.txt").as_deref(),
            Some("my_report_v2.txt")
        );
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("etc_passwd")
        );
        assert_eq!(
            sanitize_filename("..\\secret$.json").as_deref(),
            Some("secret.json")
        );
        assert_eq!(sanitize_filename("../.."), None);
        assert_eq!(sanitize_filename(""), None);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
    }

    #[test]
    fn test_is_allowed_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.is_allowed("circuit.QASM"));
        assert!(!store.is_allowed("run.exe"));
        assert!(!store.is_allowed("README"));
    }

    #[tokio::test]
    async fn test_store_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let stored = store.store("notes.txt", b"hello").await.unwrap();
        assert!(stored.filename.starts_with("notes_"));
        assert!(stored.filename.ends_with(".txt"));
        assert_eq!(stored.original_filename, "notes.txt");
        assert_eq!(stored.size, 5);

        let (name, bytes) = store.read(&stored.filename).await.unwrap();
        assert_eq!(name, stored.filename);
        assert_eq!(bytes, b"hello");

        store.delete(&stored.filename).await.unwrap();
        assert!(matches!(
            store.read(&stored.filename).await,
            Err(BlobError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&stored.filename).await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_same_second_uploads_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let a = store.store("a.txt", b"first").await.unwrap();
        let b = store.store("a.txt", b"second").await.unwrap();
        assert_ne!(a.filename, b.filename);

        assert_eq!(store.read(&a.filename).await.unwrap().1, b"first");
        assert_eq!(store.read(&b.filename).await.unwrap().1, b"second");
    }

    #[tokio::test]
    async fn test_store_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        assert!(matches!(
            store.store("", b"x").await,
            Err(BlobError::NoFileSelected)
        ));
        assert!(matches!(
            store.store("tool.exe", b"x").await,
            Err(BlobError::ExtensionNotAllowed { .. })
        ));
        assert!(matches!(
            store.store("big.txt", &[0u8; 2048]).await,
            Err(BlobError::TooLarge { limit: 1024 })
        ));
    }

    #[tokio::test]
    async fn test_list_reports_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        store.store("one.json", b"{}").await.unwrap();
        store.store("two.qasm", b"OPENQASM 3.0;").await.unwrap();

        let files = store.list().await.unwrap();
        assert_eq!(files.len(), 2);
        for f in &files {
            assert_eq!(f.download_url, format!("/download/{}", f.filename));
        }
        assert!(files.windows(2).all(|w| w[0].created >= w[1].created));
    }

    #[tokio::test]
    async fn test_read_traversal_stays_in_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let result = store.read("../../etc/passwd").await;
        assert!(matches!(result, Err(BlobError::NotFound(name)) if name == "etc_passwd"));
    }

    /// Accepts nothing; every write fails.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::other("no space left on device")))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_partial_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let path = dir.path().join("half_20260101_000000.txt");
        std::fs::write(&path, b"hal").unwrap();

        let err = write_or_discard(&path, FullDisk, b"half written").await.unwrap_err();
        assert!(matches!(err, BlobError::Io(_)));
        assert!(!path.exists());
        assert!(store.list().await.unwrap().is_empty());
    }
}
