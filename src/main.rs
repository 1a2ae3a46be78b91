use archive_uploader::infrastructure::{http, storage};
use archive_uploader::{Pipeline, TransferRequest, UploaderConfig};
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Download a zip/tar archive and upload its contents to an S3 bucket
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL to the archive
    url: String,

    /// S3 bucket name
    bucket: String,

    /// S3 key prefix for uploaded files
    #[arg(default_value = "")]
    prefix: String,

    /// Number of concurrent upload workers (overrides UPLOAD_WORKERS)
    #[arg(short, long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "archive_uploader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = UploaderConfig::from_env();
    if let Some(workers) = args.workers {
        config.max_workers = workers.max(1);
    }

    let request = TransferRequest::new(args.url, args.bucket, args.prefix)?;
    info!(
        "🚀 Transferring {} to s3://{}/{} [Workers: {}]",
        request.source_url(),
        request.bucket(),
        request.key_prefix(),
        config.max_workers
    );

    let transfer = http::setup_http_client()?;
    let store = storage::setup_storage(&config).await;
    let pipeline = Pipeline::new(transfer, store, &config);

    pipeline.run(&request).await?;
    Ok(())
}
