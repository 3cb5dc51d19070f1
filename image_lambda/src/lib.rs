//! Image upload pipeline: thumbnails, embedded metadata and vision labels for
//! images dropped under `uploads/` in an object store.

pub mod config;
pub mod error;
pub mod handlers;
pub mod key;
pub mod labels;
pub mod metadata;
pub mod store;
pub mod table;
pub mod thumbnail;
pub mod trigger;
pub mod upload;
pub mod vision;

pub use error::{PipelineError, Result};
