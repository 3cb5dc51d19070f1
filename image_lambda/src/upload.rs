//! Helpers for the operator CLI: pushing local images into the pipeline and
//! waiting for the thumbnail it produces.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::key::{ImageKey, UPLOADS_PREFIX};
use crate::store::ObjectStore;
use crate::trigger::ObjectRef;

/// Contents of the uploader's JSON configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(rename = "BucketName")]
    pub bucket_name: String,
    /// Upper bound, in seconds, on a single sleep while polling for the thumbnail.
    #[serde(rename = "MaxWait")]
    pub max_wait: u64,
}

impl UploadConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("could not parse {}", path.display()))
    }
}

/// The key a local file is uploaded under: `uploads/<file name>`.
pub fn upload_key(path: &Path) -> Result<ImageKey> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            PipelineError::validation(format!("{} has no usable file name", path.display()))
        })?;
    ImageKey::parse_upload(&format!("{UPLOADS_PREFIX}{file_name}"))
}

/// Sleeps of 1s, 2s, 4s, ... for as long as each stays below `max_wait`.
pub fn backoff_delays(max_wait: Duration) -> impl Iterator<Item = Duration> {
    std::iter::successors(Some(Duration::from_secs(1)), |delay| delay.checked_mul(2))
        .take_while(move |delay| *delay < max_wait)
}

/// Result of polling the store for an object.
#[derive(Debug)]
pub struct PollOutcome {
    pub content: Option<Vec<u8>>,
    pub waited: Duration,
}

/// Polls `bucket/key` with exponentially increasing sleeps until it can be read.
///
/// Every failed read is retried until the schedule runs out; the first success ends the wait.
#[tracing::instrument(skip(store))]
pub async fn wait_for_object(
    store: &ObjectStore,
    bucket: &str,
    key: &str,
    max_wait: Duration,
) -> PollOutcome {
    let mut waited = Duration::ZERO;
    for delay in backoff_delays(max_wait) {
        tracing::info!("Waiting {} seconds to download {key}", delay.as_secs());
        tokio::time::sleep(delay).await;
        waited += delay;

        match store.get(bucket, key).await {
            Ok(content) => {
                return PollOutcome {
                    content: Some(content),
                    waited,
                }
            }
            Err(err) => tracing::debug!(error=?err, "object not available yet"),
        }
    }

    PollOutcome {
        content: None,
        waited,
    }
}

/// A local file after it has been written to the store.
#[derive(Debug)]
pub struct Uploaded {
    pub object: ObjectRef,
    pub key: ImageKey,
    pub content: Vec<u8>,
}

/// Reads `path` and stores it under its upload key.
pub async fn upload_file(
    store: &ObjectStore,
    bucket: &str,
    path: &Path,
) -> anyhow::Result<Uploaded> {
    let key = upload_key(path)?;
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("unable to open file {}", path.display()))?;
    let object = ObjectRef::new(bucket, key.to_string());
    store.put(bucket, &object.key, content.clone()).await?;
    Ok(Uploaded {
        object,
        key,
        content,
    })
}
