use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures a pipeline component can report to its caller.
///
/// Validation failures are always raised before any call to the object store,
/// the table or the vision service.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{0} was not found")]
    NotFound(String),

    #[error("{context}: {source}")]
    Dependency {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("could not process image: {0}")]
    Image(#[from] image::ImageError),

    #[error("could not decode image metadata: {0}")]
    Metadata(#[from] exif::Error),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wraps the failure of an external call with a description of what was attempted.
    pub fn dependency<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Dependency {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_message_keeps_context_and_source() {
        let err = PipelineError::dependency(
            "could not put item",
            std::io::Error::new(std::io::ErrorKind::Other, "throttled"),
        );
        assert_eq!(err.to_string(), "could not put item: throttled");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_validation());
    }
}
