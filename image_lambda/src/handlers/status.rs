use lambda_runtime::{tracing, Error, LambdaEvent};
use serde::Serialize;

pub const SUCCEEDED: &str = "SUCCEEDED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub status: &'static str,
}

/// Status poll for the state machine; the pipeline steps are synchronous, so
/// by the time this runs the job has finished.
pub async fn function_handler(event: LambdaEvent<serde_json::Value>) -> Result<JobStatus, Error> {
    tracing::debug!(payload=%event.payload, "status requested");
    Ok(JobStatus { status: SUCCEEDED })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_runtime::Context;
    use serde_json::json;

    #[tokio::test]
    async fn reports_success() {
        let event = LambdaEvent {
            payload: json!({ "guid": "1234" }),
            context: Context::default(),
        };
        let response = function_handler(event).await.unwrap();
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({ "status": "SUCCEEDED" })
        );
    }
}
