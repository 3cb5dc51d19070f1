use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use image_lambda::config::Config;
use image_lambda::handlers::thumbnail::function_handler;
use image_lambda::store::ObjectStore;
use lambda_runtime::{run, service_fn, tracing, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::subscriber::fmt().json().init();
    let config = Config::from_env()?;
    let shared_config = aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await;
    let store = ObjectStore::new(S3Client::new(&shared_config));
    let bounds = config.thumbnail_bounds;
    run(service_fn(|event| function_handler(event, &store, bounds))).await
}
