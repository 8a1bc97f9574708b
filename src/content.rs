//! Content access for paths that already passed the [`PathGuard`](crate::sandbox::PathGuard).
//!
//! Every read stats first: a directory or a missing path both come back as
//! [`DocumentError::NotFound`] without attempting a read.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DocumentError, DocumentResult};
use crate::sandbox::ResolvedPath;

/// Text content of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
}

/// Raw bytes of an asset plus the content type to serve them with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Reads documents and assets from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentAccessor;

impl ContentAccessor {
    pub fn new() -> Self {
        Self
    }

    /// Read a document as UTF-8 text.
    ///
    /// Malformed byte sequences are replaced rather than rejected.
    pub async fn read_file(&self, resolved: &ResolvedPath) -> DocumentResult<FileContent> {
        let bytes = self.read_regular_file(resolved).await?;
        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };

        Ok(FileContent {
            path: resolved.relative().to_string(),
            content,
        })
    }

    /// Read an asset (image, attachment, ...) as raw bytes.
    pub async fn read_asset(&self, resolved: &ResolvedPath) -> DocumentResult<Asset> {
        let bytes = self.read_regular_file(resolved).await?;
        Ok(Asset {
            bytes,
            content_type: content_type_for(resolved.absolute()),
        })
    }

    async fn read_regular_file(&self, resolved: &ResolvedPath) -> DocumentResult<Vec<u8>> {
        let not_found = || DocumentError::not_found(resolved.relative());

        let metadata = tokio::fs::metadata(resolved.absolute())
            .await
            .map_err(|_| not_found())?;
        if !metadata.is_file() {
            crate::debug_event!("content", "not a file", "{}", resolved.relative());
            return Err(not_found());
        }

        tokio::fs::read(resolved.absolute()).await.map_err(|e| {
            tracing::debug!("[content] read failed for {}: {e}", resolved.relative());
            not_found()
        })
    }
}

/// Guess a content type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "md" | "markdown" => "text/markdown; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "avif" => "image/avif",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::PathGuard;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathGuard) {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("docs")).unwrap();
        fs::write(temp_dir.path().join("docs/intro.md"), "# Intro\n").unwrap();
        fs::write(temp_dir.path().join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        let guard = PathGuard::new(temp_dir.path()).unwrap();
        (temp_dir, guard)
    }

    #[tokio::test]
    async fn test_read_file() {
        let (_dir, guard) = setup();
        let resolved = guard.resolve("docs/intro.md").unwrap();

        let content = ContentAccessor::new().read_file(&resolved).await.unwrap();
        assert_eq!(content.path, "docs/intro.md");
        assert_eq!(content.content, "# Intro\n");
    }

    #[tokio::test]
    async fn test_directory_is_not_found() {
        let (_dir, guard) = setup();

        for path in ["docs", ""] {
            let resolved = guard.resolve(path).unwrap();
            let result = ContentAccessor::new().read_file(&resolved).await;
            assert!(
                matches!(result, Err(DocumentError::NotFound { .. })),
                "{path:?} should be NotFound"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_is_not_found() {
        let (_dir, guard) = setup();
        let resolved = guard.resolve("docs/missing.md").unwrap();

        let result = ContentAccessor::new().read_asset(&resolved).await;
        assert!(matches!(result, Err(DocumentError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_read_asset_bytes_and_type() {
        let (_dir, guard) = setup();
        let resolved = guard.resolve("logo.png").unwrap();

        let asset = ContentAccessor::new().read_asset(&resolved).await.unwrap();
        assert_eq!(asset.bytes, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(asset.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let (dir, guard) = setup();
        fs::write(dir.path().join("bad.md"), [b'o', b'k', 0xff]).unwrap();
        let resolved = guard.resolve("bad.md").unwrap();

        let content = ContentAccessor::new().read_file(&resolved).await.unwrap();
        assert_eq!(content.content, "ok\u{fffd}");
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(content_type_for(Path::new("a.SVG")), "image/svg+xml");
        assert_eq!(content_type_for(Path::new("archive.bin")), "application/octet-stream");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }
}
