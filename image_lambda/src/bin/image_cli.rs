use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use clap::{Parser, Subcommand};
use image_lambda::config::Config;
use image_lambda::key::ImageKey;
use image_lambda::labels::{detect_and_merge, DEFAULT_MIN_LABELS};
use image_lambda::store::ObjectStore;
use image_lambda::table::MetadataTable;
use image_lambda::thumbnail;
use image_lambda::upload::{self, UploadConfig};
use image_lambda::vision::LabelDetector;
use image_lambda::{metadata, PipelineError};
use tracing_subscriber::EnvFilter;

/// Operator tools for the image upload pipeline.
#[derive(Debug, Parser)]
#[command(name = "image_cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check whether a key would be accepted by the metadata function.
    CheckKey {
        /// The key of the photo (JPG or PNG with an `uploads/` prefix).
        #[arg(short, long)]
        key: String,
    },

    /// Upload a file and wait for its thumbnail to appear.
    Upload {
        /// The file to upload.
        #[arg(short, long)]
        file: PathBuf,

        /// JSON file holding `BucketName` and `MaxWait`.
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,
    },

    /// Print the metadata tags of a local JPG or PNG, sorted by name.
    Metadata {
        /// The file to read tags from.
        #[arg(short, long)]
        file: PathBuf,

        /// Also store the tags in this table, keyed by the file's upload key.
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Upload a file, then write its thumbnail, metadata record and labels directly.
    Process {
        /// The bucket to upload the file to.
        #[arg(short, long)]
        bucket: String,

        /// The table to store image data in.
        #[arg(short, long)]
        table: String,

        /// The file to upload.
        #[arg(short, long)]
        file: PathBuf,

        /// Fewest labels worth recording.
        #[arg(long, default_value_t = DEFAULT_MIN_LABELS)]
        min_labels: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::CheckKey { key } => check_key(&key),
        Command::Upload { file, config } => upload_and_wait(&file, &config).await,
        Command::Metadata { file, table } => print_metadata(&file, table.as_deref()).await,
        Command::Process {
            bucket,
            table,
            file,
            min_labels,
        } => process(&bucket, &table, &file, min_labels).await,
    }
}

fn check_key(key: &str) -> Result<()> {
    println!("Testing whether {key} is a valid photo file");
    match ImageKey::parse_upload(key) {
        Ok(_) => println!("{key} is valid"),
        Err(PipelineError::Validation(reason)) => {
            println!("{key} is not valid because:");
            println!("{reason}");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

async fn upload_and_wait(file: &Path, config_path: &Path) -> Result<()> {
    let config = UploadConfig::load(config_path)?;
    let shared_config = aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await;
    let store = ObjectStore::new(aws_sdk_s3::Client::new(&shared_config));

    let uploaded = upload::upload_file(&store, &config.bucket_name, file).await?;
    tracing::info!(
        bucket = %uploaded.object.bucket,
        key = %uploaded.object.key,
        "uploaded file"
    );

    let thumbnail_key = uploaded.key.thumbnail_key();
    let outcome = upload::wait_for_object(
        &store,
        &config.bucket_name,
        &thumbnail_key,
        Duration::from_secs(config.max_wait),
    )
    .await;

    let local_name = Path::new(&thumbnail_key)
        .file_name()
        .context("thumbnail key has no file name")?;
    match outcome.content {
        Some(content) => {
            tokio::fs::write(local_name, content)
                .await
                .with_context(|| format!("could not save {}", local_name.to_string_lossy()))?;
            println!("Saved {}", local_name.to_string_lossy());
        }
        None => println!(
            "Waited {} seconds total, but did not download {thumbnail_key}",
            outcome.waited.as_secs()
        ),
    }
    Ok(())
}

async fn print_metadata(file: &Path, table_name: Option<&str>) -> Result<()> {
    let key = upload::upload_key(file)?.to_string();
    let source = tokio::fs::read(file)
        .await
        .with_context(|| format!("unable to open file {}", file.display()))?;

    let table = match table_name {
        Some(name) => {
            let shared_config = aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await;
            Some(MetadataTable::new(aws_sdk_dynamodb::Client::new(&shared_config), name))
        }
        None => None,
    };

    let tags = metadata::inspect(table.as_ref(), &key, &source).await?;
    for line in metadata::tag_lines(&tags) {
        println!("{line}");
    }
    if let Some(name) = table_name {
        println!("Stored {} tags for {key} in {name}", tags.len());
    }
    Ok(())
}

async fn process(bucket: &str, table: &str, file: &Path, min_labels: usize) -> Result<()> {
    // reject bad names before touching anything remote
    upload::upload_key(file)?;
    let bounds = Config::from_env()?.thumbnail_bounds;

    let shared_config = aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await;
    let store = ObjectStore::new(aws_sdk_s3::Client::new(&shared_config));
    let table = MetadataTable::new(aws_sdk_dynamodb::Client::new(&shared_config), table);
    let detector = LabelDetector::new(aws_sdk_rekognition::Client::new(&shared_config));

    let uploaded = upload::upload_file(&store, bucket, file).await?;
    println!("Uploaded {} to {bucket}", uploaded.object.key);

    let thumbnail =
        thumbnail::publish(&store, bucket, &uploaded.key, &uploaded.content, bounds).await?;
    println!("Created thumbnail {}", thumbnail.key);

    let record = metadata::store_record(&table, &uploaded.object.key, &uploaded.content).await?;
    println!("Saved {} metadata attributes", record.attributes.len());

    let labels = detect_and_merge(&detector, &table, &uploaded.object, min_labels).await?;
    for label in &labels {
        println!("{}: {}", label.name, label.confidence_value());
    }
    Ok(())
}
