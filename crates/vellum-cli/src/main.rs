//! vellum CLI
//!
//! 設定ファイルから ObjectStore を組み立てて、upload / list / download を実行します。

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use tracing::info;
use vellum_core::app::UploadValidator;
use vellum_core::{StoreBuilder, StoreConfig};

/// Vellum: signed object store.
#[derive(Parser, Debug)]
#[command(name = "vellum", version, about)]
struct Cli {
    /// TOML config file.
    #[arg(long, short, default_value = "vellum.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Sign and store a file, then print its public id.
    Upload {
        file: PathBuf,
        /// Stored name (defaults to the file name).
        #[arg(long)]
        name: Option<String>,
        /// MIME type (guessed from the extension when omitted).
        #[arg(long)]
        mime: Option<String>,
    },
    /// Print metadata of all stored objects as JSON.
    List,
    /// Fetch the bytes of a stored object.
    Download {
        public_id: String,
        /// Output path (stdout when omitted).
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = StoreConfig::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    let store = StoreBuilder::from_config(&config)
        .await
        .context("wiring object store")?
        .build()
        .await
        .context("starting object store")?;

    match cli.command {
        Commands::Upload { file, name, mime } => {
            let payload = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let name = match name {
                Some(name) => name,
                None => file_name(&file)?,
            };
            let mime = mime.unwrap_or_else(|| guess_mime(&name).to_string());

            UploadValidator::new(&config.upload)
                .validate(&name, &mime, payload.len() as u64, store.catalog().as_ref())
                .await?;
            let public_id = store.upload(Bytes::from(payload), &name, &mime).await?;
            println!("{public_id}");
        }
        Commands::List => {
            let metas = store.list_metadata().await?;
            println!("{}", serde_json::to_string_pretty(&metas)?);
        }
        Commands::Download { public_id, out } => {
            let bytes = store.download(&public_id).await?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, &bytes)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(public_id = %public_id, path = %path.display(), size = bytes.len(), "written");
                }
                None => std::io::stdout().write_all(&bytes)?,
            }
        }
    }

    Ok(())
}

fn file_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name, pass --name", path.display()))
}

/// 拡張子から MIME type を推測する（よく使う画像形式のみ）
fn guess_mime(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
