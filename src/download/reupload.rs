//! Document re-upload pipeline
//!
//! Downloads the user's document into a scratch directory, optionally renames it, attaches the stored
//! thumbnail and sends it back. The scratch directory is a [`tempfile::TempDir`], so it is removed on
//! every exit path, including early returns on download or upload failure.

use std::path::PathBuf;
use std::sync::Arc;
use teloxide::types::ChatId;

use crate::core::error::PipelineError;
use crate::core::types::{DocumentRef, ThumbnailRef};
use crate::telegram::transport::Transport;

/// Local name of the downloaded document inside the scratch directory
const DOCUMENT_FILE: &str = "document.bin";
/// Local name of the downloaded thumbnail inside the scratch directory
const THUMBNAIL_FILE: &str = "thumbnail.jpg";

/// Outcome of a successful re-upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReuploadReport {
    /// Name the document was sent with
    pub filename: String,
    /// Whether the thumbnail could be attached
    pub with_thumbnail: bool,
    /// Bytes downloaded from the source document
    pub size: u64,
}

/// Picks the name the document is re-sent with.
///
/// A requested name wins when it is non-empty after trimming; path separators in it are replaced so
/// it stays a single file name. Otherwise the original name is kept exactly as it arrived.
pub fn resolve_filename(requested: Option<&str>, original: &str) -> String {
    match requested.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.chars().map(|c| if matches!(c, '/' | '\\') { '_' } else { c }).collect(),
        None => original.to_string(),
    }
}

/// Re-sends documents with a thumbnail through a [`Transport`].
#[derive(Clone)]
pub struct ReuploadPipeline {
    transport: Arc<dyn Transport>,
    temp_root: PathBuf,
}

impl ReuploadPipeline {
    /// Creates a pipeline that keeps scratch directories under `temp_root`.
    pub fn new(transport: Arc<dyn Transport>, temp_root: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            temp_root: temp_root.into(),
        }
    }

    /// Downloads `document`, renames it to `requested` (if given) and sends it back to `chat`.
    ///
    /// Thumbnail problems never fail the upload: the document is then sent without one.
    pub async fn reupload(
        &self,
        chat: ChatId,
        document: &DocumentRef,
        requested: Option<&str>,
        thumbnail: Option<&ThumbnailRef>,
    ) -> Result<ReuploadReport, PipelineError> {
        fs_err::tokio::create_dir_all(&self.temp_root)
            .await
            .map_err(PipelineError::TempStorage)?;
        let workdir = tempfile::Builder::new()
            .prefix("rethumb-")
            .tempdir_in(&self.temp_root)
            .map_err(PipelineError::TempStorage)?;

        let filename = resolve_filename(requested, &document.original_filename);
        log::info!(
            "📥 Re-upload for chat {}: {} ({} bytes) as {:?}",
            chat,
            document.original_filename,
            document.size,
            filename
        );

        let document_path = workdir.path().join(DOCUMENT_FILE);
        let size = self
            .transport
            .download(&document.file_id, &document_path)
            .await
            .map_err(PipelineError::Download)?;

        let thumbnail_path = match thumbnail {
            Some(thumbnail) => {
                let path = workdir.path().join(THUMBNAIL_FILE);
                match self.transport.download(thumbnail.as_str(), &path).await {
                    Ok(_) => Some(path),
                    Err(e) => {
                        log::warn!(
                            "⚠️ Thumbnail {} unavailable for chat {}, sending without it: {}",
                            thumbnail,
                            chat,
                            e
                        );
                        None
                    }
                }
            }
            None => None,
        };

        self.transport
            .send_document(chat, &document_path, &filename, thumbnail_path.as_deref())
            .await
            .map_err(PipelineError::Upload)?;

        if let Err(e) = workdir.close() {
            log::warn!("Failed to remove scratch directory: {}", e);
        }

        log::info!("📤 Re-uploaded {:?} to chat {} ({} bytes)", filename, chat, size);

        Ok(ReuploadReport {
            filename,
            with_thumbnail: thumbnail_path.is_some(),
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_requested_name_is_trimmed() {
        assert_eq!(resolve_filename(Some("  report.pdf \n"), "scan.pdf"), "report.pdf");
    }

    #[test]
    fn test_missing_or_blank_request_keeps_original() {
        assert_eq!(resolve_filename(None, "scan.pdf"), "scan.pdf");
        assert_eq!(resolve_filename(Some("   "), "scan.pdf"), "scan.pdf");
    }

    #[test]
    fn test_original_name_is_not_rewritten() {
        assert_eq!(resolve_filename(None, "a/b.pdf"), "a/b.pdf");
        assert_eq!(resolve_filename(Some(" "), " scan.pdf "), " scan.pdf ");
    }

    #[test]
    fn test_path_separators_are_replaced() {
        assert_eq!(resolve_filename(Some("../etc/passwd"), "scan.pdf"), ".._etc_passwd");
        assert_eq!(resolve_filename(Some("a\\b.txt"), "scan.pdf"), "a_b.txt");
    }

    #[test]
    fn test_unicode_names_survive() {
        assert_eq!(resolve_filename(Some("отчёт 2024.pdf"), "scan.pdf"), "отчёт 2024.pdf");
    }
}
