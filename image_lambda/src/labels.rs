//! Folds vision labels into the metadata record of the object they describe.

use crate::error::{PipelineError, Result};
use crate::key::record_key;
use crate::table::MetadataTable;
use crate::trigger::ObjectRef;
use crate::vision::LabelDetector;

/// Fewest labels worth recording for an object.
pub const DEFAULT_MIN_LABELS: usize = 2;

/// A single (label, confidence) pair returned by the vision service.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEntry {
    pub name: String,
    pub confidence: f32,
}

impl LabelEntry {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }

    /// `Cat` is stored as `CatConfidence`.
    pub fn attribute_name(&self) -> String {
        format!("{}Confidence", self.name)
    }

    pub fn confidence_value(&self) -> String {
        format!("{:.6}", self.confidence)
    }
}

/// Writes each label as its own attribute update on the record for `key`.
///
/// Updates are issued one at a time with no transaction around them, so if the
/// n-th update fails the first n-1 stay committed. Returns the number of
/// attributes written.
#[tracing::instrument(skip(table, labels), fields(labels = labels.len()))]
pub async fn merge_labels(
    table: &MetadataTable,
    key: &str,
    labels: &[LabelEntry],
    min_labels: usize,
) -> Result<usize> {
    let labels = labels
        .iter()
        .filter(|label| !label.name.is_empty())
        .collect::<Vec<_>>();

    if labels.len() < min_labels {
        return Err(PipelineError::validation(format!(
            "got only {} label entries, need at least {min_labels}",
            labels.len()
        )));
    }

    let record_key = record_key(key);
    for label in &labels {
        table
            .update_attribute(&record_key, &label.attribute_name(), &label.confidence_value())
            .await?;
    }

    tracing::info!(key = %record_key, count = labels.len(), "merged labels");
    Ok(labels.len())
}

/// Asks the vision service for labels on `object` and merges them into its record.
pub async fn detect_and_merge(
    detector: &LabelDetector,
    table: &MetadataTable,
    object: &ObjectRef,
    min_labels: usize,
) -> Result<Vec<LabelEntry>> {
    let labels = detector.detect_labels(&object.bucket, &object.key).await?;
    merge_labels(table, &object.key, &labels, min_labels).await?;
    Ok(labels)
}
