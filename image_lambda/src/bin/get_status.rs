use image_lambda::handlers::status::function_handler;
use lambda_runtime::{run, service_fn, tracing, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::subscriber::fmt().json().init();
    run(service_fn(function_handler)).await
}
