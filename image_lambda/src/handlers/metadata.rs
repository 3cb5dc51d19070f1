use lambda_runtime::{tracing, Error, LambdaEvent};
use serde::Serialize;

use crate::metadata::save_metadata;
use crate::store::ObjectStore;
use crate::table::MetadataTable;
use crate::trigger::{s3_event_objects, MetadataTrigger, ObjectRef};

/// Seconds the state machine waits before polling for the job status.
pub const STEP_WAIT_SECONDS: u64 = 5;

/// Output handed to the next state machine step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataSaved {
    #[serde(flatten)]
    pub object: ObjectRef,
    #[serde(rename = "waitTimeout")]
    pub wait_timeout: u64,
}

/// A CloudTrail invocation is one state machine step and answers with a single
/// object the label step can take as its input. S3 notifications may carry
/// several records and answer with a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataResponse {
    Single(MetadataSaved),
    Batch(Vec<MetadataSaved>),
}

pub async fn function_handler(
    event: LambdaEvent<MetadataTrigger>,
    store: &ObjectStore,
    table: &MetadataTable,
) -> Result<MetadataResponse, Error> {
    match event.payload {
        MetadataTrigger::CloudTrail(event) => {
            let saved = save_object(store, table, event.object()).await?;
            Ok(MetadataResponse::Single(saved))
        }
        MetadataTrigger::S3(event) => {
            let objects = s3_event_objects(&event)?;
            if objects.is_empty() {
                tracing::warn!("No objects found in event");
            }

            let mut saved = Vec::with_capacity(objects.len());
            for object in objects {
                saved.push(save_object(store, table, object).await?);
            }
            Ok(MetadataResponse::Batch(saved))
        }
    }
}

async fn save_object(
    store: &ObjectStore,
    table: &MetadataTable,
    object: ObjectRef,
) -> Result<MetadataSaved, Error> {
    if let Err(err) = save_metadata(store, table, &object.bucket, &object.key).await {
        tracing::error!(
            error=?err,
            bucket=%object.bucket,
            key=%object.key,
            "error saving metadata"
        );
        return Err(err.into());
    }
    tracing::info!("Saved metadata from key '{}' in bucket '{}'", object.key, object.bucket);
    Ok(MetadataSaved {
        object,
        wait_timeout: STEP_WAIT_SECONDS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::thumbnail::tests::s3_event;
    use crate::metadata::tests::tagged_jpeg;
    use crate::trigger::CloudTrailObjectEvent;
    use aws_sdk_dynamodb::operation::put_item::PutItemOutput;
    use aws_sdk_s3::operation::get_object::GetObjectOutput;
    use aws_sdk_s3::primitives::ByteStream;
    use aws_smithy_mocks::{mock, mock_client};
    use lambda_runtime::Context;
    use serde_json::json;

    #[tokio::test]
    async fn saves_metadata_for_cloudtrail_event() {
        let detail: CloudTrailObjectEvent = serde_json::from_value(json!({
            "detail": {
                "requestParameters": { "bucketName": "test-bucket", "key": "uploads/photo.jpg" }
            }
        }))
        .unwrap();
        let event = LambdaEvent {
            payload: MetadataTrigger::CloudTrail(detail),
            context: Context::default(),
        };

        let source = tagged_jpeg("Fujifilm", "X100");
        let get_object_rule = mock!(aws_sdk_s3::Client::get_object).then_output(move || {
            GetObjectOutput::builder()
                .body(ByteStream::from(source.clone()))
                .build()
        });
        let put_item_rule = mock!(aws_sdk_dynamodb::Client::put_item)
            .then_output(|| PutItemOutput::builder().build());
        let store = ObjectStore::new(mock_client!(aws_sdk_s3, [&get_object_rule]));
        let table = MetadataTable::new(mock_client!(aws_sdk_dynamodb, [&put_item_rule]), "images");

        let response = function_handler(event, &store, &table).await.unwrap();
        assert_eq!(put_item_rule.num_calls(), 1);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "Bucket": "test-bucket", "Key": "uploads/photo.jpg", "waitTimeout": 5 })
        );
    }

    #[tokio::test]
    async fn cloudtrail_response_is_valid_label_step_input() {
        let detail: CloudTrailObjectEvent = serde_json::from_value(json!({
            "detail": {
                "requestParameters": { "bucketName": "test-bucket", "key": "uploads/photo.jpg" }
            }
        }))
        .unwrap();
        let event = LambdaEvent {
            payload: MetadataTrigger::CloudTrail(detail),
            context: Context::default(),
        };

        let source = tagged_jpeg("Fujifilm", "X100");
        let get_object_rule = mock!(aws_sdk_s3::Client::get_object).then_output(move || {
            GetObjectOutput::builder()
                .body(ByteStream::from(source.clone()))
                .build()
        });
        let put_item_rule = mock!(aws_sdk_dynamodb::Client::put_item)
            .then_output(|| PutItemOutput::builder().build());
        let store = ObjectStore::new(mock_client!(aws_sdk_s3, [&get_object_rule]));
        let table = MetadataTable::new(mock_client!(aws_sdk_dynamodb, [&put_item_rule]), "images");

        let response = function_handler(event, &store, &table).await.unwrap();
        let next_input: ObjectRef =
            serde_json::from_value(serde_json::to_value(&response).unwrap()).unwrap();
        assert_eq!(next_input, ObjectRef::new("test-bucket", "uploads/photo.jpg"));
    }

    #[tokio::test]
    async fn s3_notification_answers_with_a_list() {
        let event = LambdaEvent {
            payload: MetadataTrigger::S3(s3_event("test-bucket", &["uploads/photo.jpg"])),
            context: Context::default(),
        };
        let source = tagged_jpeg("Fujifilm", "X100");
        let get_object_rule = mock!(aws_sdk_s3::Client::get_object).then_output(move || {
            GetObjectOutput::builder()
                .body(ByteStream::from(source.clone()))
                .build()
        });
        let put_item_rule = mock!(aws_sdk_dynamodb::Client::put_item)
            .then_output(|| PutItemOutput::builder().build());
        let store = ObjectStore::new(mock_client!(aws_sdk_s3, [&get_object_rule]));
        let table = MetadataTable::new(mock_client!(aws_sdk_dynamodb, [&put_item_rule]), "images");

        let response = function_handler(event, &store, &table).await.unwrap();
        assert_eq!(
            response,
            MetadataResponse::Batch(vec![MetadataSaved {
                object: ObjectRef::new("test-bucket", "uploads/photo.jpg"),
                wait_timeout: STEP_WAIT_SECONDS,
            }])
        );
    }

    #[tokio::test]
    async fn rejected_key_writes_nothing() {
        let event = LambdaEvent {
            payload: MetadataTrigger::S3(s3_event("test-bucket", &["thumbs/photothumb.jpg"])),
            context: Context::default(),
        };
        let get_object_rule = mock!(aws_sdk_s3::Client::get_object)
            .then_output(|| GetObjectOutput::builder().build());
        let put_item_rule = mock!(aws_sdk_dynamodb::Client::put_item)
            .then_output(|| PutItemOutput::builder().build());
        let store = ObjectStore::new(mock_client!(aws_sdk_s3, [&get_object_rule]));
        let table = MetadataTable::new(mock_client!(aws_sdk_dynamodb, [&put_item_rule]), "images");

        assert!(function_handler(event, &store, &table).await.is_err());
        assert_eq!(get_object_rule.num_calls(), 0);
        assert_eq!(put_item_rule.num_calls(), 0);
    }
}
