//! Thumbnail persistence

pub mod thumbnails;

// Re-exports for convenience
pub use thumbnails::ThumbnailStore;
