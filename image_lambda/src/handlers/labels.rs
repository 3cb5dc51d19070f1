use lambda_runtime::{tracing, Error, LambdaEvent};

use crate::labels::detect_and_merge;
use crate::table::MetadataTable;
use crate::trigger::ObjectRef;
use crate::vision::LabelDetector;

/// Detects labels on the object named in the event and merges them into its record.
pub async fn function_handler(
    event: LambdaEvent<ObjectRef>,
    detector: &LabelDetector,
    table: &MetadataTable,
    min_labels: usize,
) -> Result<ObjectRef, Error> {
    let object = event.payload;
    tracing::info!(bucket=%object.bucket, key=%object.key, "detecting labels");

    match detect_and_merge(detector, table, &object, min_labels).await {
        Ok(labels) => {
            tracing::info!(count = labels.len(), key=%object.key, "saved labels");
            Ok(object)
        }
        Err(err) => {
            tracing::error!(
                error=?err,
                bucket=%object.bucket,
                key=%object.key,
                "error saving labels"
            );
            Err(err.into())
        }
    }
}
