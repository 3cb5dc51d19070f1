//! Lambda entry points, one per deployed function.

pub mod labels;
pub mod metadata;
pub mod status;
pub mod thumbnail;
