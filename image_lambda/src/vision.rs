use aws_sdk_rekognition::types::{Image, S3Object};

use crate::error::{PipelineError, Result};
use crate::labels::LabelEntry;

/// Vision labelling service that reads images straight from the object store.
#[derive(Clone, Debug)]
pub struct LabelDetector {
    inner: aws_sdk_rekognition::Client,
}

impl LabelDetector {
    pub fn new(inner: aws_sdk_rekognition::Client) -> Self {
        Self { inner }
    }

    #[tracing::instrument(skip(self))]
    pub async fn detect_labels(&self, bucket: &str, key: &str) -> Result<Vec<LabelEntry>> {
        let image = Image::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();

        let resp = self
            .inner
            .detect_labels()
            .image(image)
            .send()
            .await
            .map_err(|e| {
                PipelineError::dependency(format!("could not detect labels for {bucket}/{key}"), e)
            })?;

        let labels = resp
            .labels()
            .iter()
            .filter_map(|label| match (label.name(), label.confidence()) {
                (Some(name), Some(confidence)) => Some(LabelEntry::new(name, confidence)),
                _ => None,
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = labels.len(), "detected labels");
        Ok(labels)
    }
}
