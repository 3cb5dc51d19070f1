use aws_sdk_s3::primitives::ByteStream;

use crate::error::{PipelineError, Result};

/// Object store holding uploads and their thumbnails.
#[derive(Clone, Debug)]
pub struct ObjectStore {
    inner: aws_sdk_s3::Client,
}

impl ObjectStore {
    pub fn new(inner: aws_sdk_s3::Client) -> Self {
        Self { inner }
    }

    /// Retrieves the provided key from the bucket.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let resp = match self.inner.get_object().bucket(bucket).key(key).send().await {
            Ok(resp) => resp,
            Err(e) if e.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                return Err(PipelineError::NotFound(format!("{bucket}/{key}")));
            }
            Err(e) => {
                return Err(PipelineError::dependency(
                    format!("could not get item {key} from bucket {bucket}"),
                    e,
                ));
            }
        };

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| PipelineError::dependency("could not collect body", e))?;
        Ok(body.into_bytes().to_vec())
    }

    /// Puts the provided content into the bucket at the provided key.
    #[tracing::instrument(skip(self, content), fields(size = content.len()))]
    pub async fn put(&self, bucket: &str, key: &str, content: Vec<u8>) -> Result<()> {
        self.inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|e| {
                PipelineError::dependency(format!("could not put item {key} in bucket {bucket}"), e)
            })?;
        Ok(())
    }
}
