//! Tessera CLI: chunked upload client for the Tessera API.
//!
//! Set TESSERA_API_URL (or API_URL) and, for gated servers, TESSERA_API_KEY. Uses X-API-Key auth.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tessera_api_client::{ApiClient, ChunkUploader, TransportError, UploadOptions};
use tessera_cli::{describe_progress, init_tracing};
use tessera_core::codec::DEFAULT_CHUNK_SIZE;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "tessera", about = "Tessera chunked upload CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file in chunks
    Upload {
        /// Path to the file to upload
        file: std::path::PathBuf,
        /// Chunk size in bytes (clamped to the accepted range)
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        /// MIME type to announce; inferred from the extension by default
        #[arg(long = "type")]
        mime_type: Option<String>,
        /// Upload ID to reuse, required with --resume-from
        #[arg(long)]
        upload_id: Option<String>,
        /// First chunk index to send
        #[arg(long, default_value = "0", requires = "upload_id")]
        resume_from: u32,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Token cancelled on Ctrl-C; the chunk in flight finishes before the upload stops.
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current chunk");
            trigger.cancel();
        }
    });
    token
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let client = ApiClient::from_env()
        .context("Failed to create API client. Set TESSERA_API_URL (or API_URL)")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            file,
            chunk_size,
            mime_type,
            upload_id,
            resume_from,
        } => {
            let uploader = ChunkUploader::new(client, chunk_size)
                .with_progress(|p| tracing::info!("{}", describe_progress(&p)));
            let options = UploadOptions {
                upload_id,
                start_index: resume_from,
                mime_type,
                cancel: Some(ctrl_c_token()),
            };

            match uploader.upload_file(&file, options).await {
                Ok(uploaded) => print_json(&uploaded)?,
                Err(err) => {
                    if let Some((upload_id, next)) = err.resume_point() {
                        tracing::warn!(
                            "Resume with: tessera upload {} --upload-id {} --resume-from {}",
                            file.display(),
                            upload_id,
                            next
                        );
                    }
                    if let TransportError::ChunkRejected {
                        details,
                        suggested_action,
                        ..
                    } = &err
                    {
                        if let Some(details) = details {
                            tracing::error!("{}", details);
                        }
                        if let Some(action) = suggested_action {
                            tracing::info!("Suggested action: {}", action);
                        }
                    }
                    return Err(err.into());
                }
            }
        }
    }

    Ok(())
}
