use std::fmt;

use crate::error::{PipelineError, Result};

pub const UPLOADS_PREFIX: &str = "uploads/";
pub const THUMBS_PREFIX: &str = "thumbs/";
const THUMB_SUFFIX: &str = "thumb";

/// Image encodings the pipeline accepts, keyed by lowercase file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpg,
    Png,
}

impl ImageFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jpg" => Some(Self::Jpg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// An object key split into its name and image format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageKey {
    name: String,
    format: ImageFormat,
}

impl ImageKey {
    /// `name.ext` where `ext` is `jpg` or `png`; the key may contain no other `.`.
    pub fn parse(key: &str) -> Result<Self> {
        let parts = key.split('.').collect::<Vec<&str>>();
        if parts.len() != 2 || parts[0].is_empty() {
            return Err(PipelineError::validation(format!(
                "could not split '{key}' into name/extension"
            )));
        }

        let format = ImageFormat::from_extension(parts[1]).ok_or_else(|| {
            PipelineError::validation(format!("extension '{}' is not jpg or png", parts[1]))
        })?;

        Ok(Self {
            name: parts[0].to_string(),
            format,
        })
    }

    /// Like [ImageKey::parse], but the name must also live under `uploads/`.
    pub fn parse_upload(key: &str) -> Result<Self> {
        let parsed = Self::parse(key)?;
        match parsed.name.strip_prefix(UPLOADS_PREFIX) {
            Some(rest) if !rest.is_empty() => Ok(parsed),
            _ => Err(PipelineError::validation(format!(
                "{key} does not have {UPLOADS_PREFIX} prefix"
            ))),
        }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn is_upload(&self) -> bool {
        self.name.starts_with(UPLOADS_PREFIX)
    }

    pub fn is_thumbnail(&self) -> bool {
        self.name.starts_with(THUMBS_PREFIX)
    }

    /// `uploads/photo.jpg` becomes `thumbs/photothumb.jpg`.
    pub fn thumbnail_key(&self) -> String {
        let name = self
            .name
            .strip_prefix(UPLOADS_PREFIX)
            .unwrap_or(&self.name);
        format!("{THUMBS_PREFIX}{name}{THUMB_SUFFIX}.{}", self.format)
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.format)
    }
}

/// Table records are keyed by the upload path, so bare names get the prefix back.
pub fn record_key(key: &str) -> String {
    if key.starts_with(UPLOADS_PREFIX) {
        key.to_string()
    } else {
        format!("{UPLOADS_PREFIX}{key}")
    }
}
