//! Shared domain types passed between the transport, the flow and the stores

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle the transport understands for a stored thumbnail (a Telegram file id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThumbnailRef(pub String);

impl ThumbnailRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThumbnailRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document the user sent, held while they decide whether to rename it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    /// Transport file id used to download the document
    pub file_id: String,
    /// Name the document arrived with
    pub original_filename: String,
    /// Size in bytes as reported by the transport
    pub size: u64,
}

impl DocumentRef {
    /// Fallback used when the client did not send a file name
    pub const DEFAULT_FILENAME: &'static str = "document";

    pub fn new(file_id: impl Into<String>, original_filename: Option<String>, size: u64) -> Self {
        let original_filename = original_filename
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_FILENAME.to_string());

        Self {
            file_id: file_id.into(),
            original_filename,
            size,
        }
    }
}

/// One resolution variant of an incoming photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoVariant {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u32,
}

impl PhotoVariant {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}
