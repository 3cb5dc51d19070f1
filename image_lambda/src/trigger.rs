use aws_lambda_events::event::s3::S3Event;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// A (bucket, key) pair identifying a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    #[serde(rename = "Bucket", alias = "bucket")]
    pub bucket: String,
    #[serde(rename = "Key", alias = "key")]
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

/// Collects the objects referenced by an S3 notification.
///
/// Notification keys arrive form-encoded, so `+` is a space and the rest is percent-decoded.
pub fn s3_event_objects(event: &S3Event) -> Result<Vec<ObjectRef>> {
    event
        .records
        .iter()
        .map(|record| {
            let bucket = record
                .s3
                .bucket
                .name
                .as_deref()
                .ok_or_else(|| PipelineError::validation("no bucket name found in S3 event"))?;
            let raw_key = record
                .s3
                .object
                .key
                .as_deref()
                .ok_or_else(|| PipelineError::validation("no object key found in S3 event"))?;
            let key = urlencoding::decode(&raw_key.replace('+', " "))
                .map_err(|e| {
                    PipelineError::validation(format!("key {raw_key} is not UTF-8: {e}"))
                })?
                .into_owned();
            Ok(ObjectRef::new(bucket, key))
        })
        .collect()
}

/// An object-level API call recorded by CloudTrail and delivered through EventBridge.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudTrailObjectEvent {
    pub detail: CloudTrailDetail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudTrailDetail {
    #[serde(default)]
    pub event_name: Option<String>,
    pub request_parameters: RequestParameters,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParameters {
    pub bucket_name: String,
    pub key: String,
}

impl CloudTrailObjectEvent {
    pub fn object(&self) -> ObjectRef {
        let params = &self.detail.request_parameters;
        ObjectRef::new(&params.bucket_name, &params.key)
    }
}

/// Payloads the metadata function can be invoked with.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MetadataTrigger {
    CloudTrail(CloudTrailObjectEvent),
    S3(S3Event),
}

impl MetadataTrigger {
    pub fn objects(&self) -> Result<Vec<ObjectRef>> {
        match self {
            Self::CloudTrail(event) => Ok(vec![event.object()]),
            Self::S3(event) => s3_event_objects(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_s3_notification_keys() {
        let trigger: MetadataTrigger = serde_json::from_value(json!({
            "Records": [{
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "us-west-2",
                "eventTime": "2021-01-01T00:00:00.000Z",
                "eventName": "ObjectCreated:Put",
                "userIdentity": { "principalId": "EXAMPLE" },
                "requestParameters": { "sourceIPAddress": "127.0.0.1" },
                "responseElements": {
                    "x-amz-request-id": "EXAMPLE123456789",
                    "x-amz-id-2": "EXAMPLE123/5678abcdefghijklambdaisawesome"
                },
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "configurationId": "testConfigRule",
                    "bucket": {
                        "name": "test-bucket",
                        "ownerIdentity": { "principalId": "EXAMPLE" },
                        "arn": "arn:aws:s3:::test-bucket"
                    },
                    "object": {
                        "key": "uploads/my+cat%281%29.jpg",
                        "size": 1024,
                        "eTag": "0123456789abcdef0123456789abcdef",
                        "sequencer": "0A1B2C3D4E5F678901"
                    }
                }
            }]
        }))
        .unwrap();

        assert!(matches!(trigger, MetadataTrigger::S3(_)));
        assert_eq!(
            trigger.objects().unwrap(),
            vec![ObjectRef::new("test-bucket", "uploads/my cat(1).jpg")]
        );
    }

    #[test]
    fn extracts_object_from_cloudtrail_detail() {
        let trigger: MetadataTrigger = serde_json::from_value(json!({
            "version": "0",
            "id": "0b2b2a6e-7a1a-4f5a-9c1b-1b2b3c4d5e6f",
            "detail-type": "AWS API Call via CloudTrail",
            "source": "aws.s3",
            "detail": {
                "eventSource": "s3.amazonaws.com",
                "eventName": "PutObject",
                "requestParameters": {
                    "bucketName": "test-bucket",
                    "Host": "test-bucket.s3.amazonaws.com",
                    "key": "uploads/photo.png",
                    "x-id": "PutObject"
                }
            }
        }))
        .unwrap();

        assert_eq!(
            trigger.objects().unwrap(),
            vec![ObjectRef::new("test-bucket", "uploads/photo.png")]
        );
    }

    #[test]
    fn object_ref_accepts_either_casing() {
        let upper: ObjectRef =
            serde_json::from_value(json!({ "Bucket": "b", "Key": "uploads/a.jpg" })).unwrap();
        let lower: ObjectRef =
            serde_json::from_value(json!({ "bucket": "b", "key": "uploads/a.jpg" })).unwrap();
        assert_eq!(upper, lower);
        assert_eq!(
            serde_json::to_value(&upper).unwrap(),
            json!({ "Bucket": "b", "Key": "uploads/a.jpg" })
        );
    }
}
