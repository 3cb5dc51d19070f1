use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_rekognition::Client as RekognitionClient;
use image_lambda::config::Config;
use image_lambda::handlers::labels::function_handler;
use image_lambda::table::MetadataTable;
use image_lambda::vision::LabelDetector;
use lambda_runtime::{run, service_fn, tracing, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::subscriber::fmt().json().init();
    let config = Config::from_env()?;
    let shared_config = aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await;
    let detector = LabelDetector::new(RekognitionClient::new(&shared_config));
    let table = MetadataTable::new(DynamoDbClient::new(&shared_config), config.table_name()?);
    let min_labels = config.min_label_count;
    run(service_fn(|event| {
        function_handler(event, &detector, &table, min_labels)
    }))
    .await
}
