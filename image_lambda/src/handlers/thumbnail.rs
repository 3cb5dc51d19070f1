use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{tracing, Error, LambdaEvent};

use crate::store::ObjectStore;
use crate::thumbnail::{create_thumbnail, Bounds};
use crate::trigger::{s3_event_objects, ObjectRef};

/// Writes a thumbnail for every object in the notification.
///
/// The first failure aborts the invocation; thumbnails already written stay in place.
pub async fn function_handler(
    event: LambdaEvent<S3Event>,
    store: &ObjectStore,
    bounds: Bounds,
) -> Result<Vec<ObjectRef>, Error> {
    let payload = event.payload;
    if payload.records.is_empty() {
        tracing::warn!("No records found in S3 event");
        return Ok(Vec::new());
    }

    let mut written = Vec::with_capacity(payload.records.len());
    for object in s3_event_objects(&payload)? {
        match create_thumbnail(store, &object, bounds).await {
            Ok(Some(thumbnail)) => {
                tracing::info!("Created thumbnail {}/{}", thumbnail.bucket, thumbnail.key);
                written.push(thumbnail);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::error!(
                    error=?err,
                    bucket=%object.bucket,
                    key=%object.key,
                    "error creating thumbnail"
                );
                return Err(err.into());
            }
        }
    }
    Ok(written)
}
