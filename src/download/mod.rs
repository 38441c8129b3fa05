//! Document download and re-upload

pub mod reupload;

pub use reupload::{resolve_filename, ReuploadPipeline, ReuploadReport};
