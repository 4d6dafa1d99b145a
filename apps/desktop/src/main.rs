mod input;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    dispatch, operation::OperationResult, ClientConfig, CommandOutcome, DownloadedFile,
};
use input::Input;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cipherviz", about = "Interactive client for the cipherviz crypto service")]
struct Args {
    /// Overrides the configured service URL.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, default_value = client_core::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Downloads land in `<download-dir>/<encrypted|decrypted>/`.
    #[arg(long, default_value = ".")]
    download_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut config = ClientConfig::load(&args.config)?;
    if let Some(url) = args.server_url {
        config.server_url = url;
    }
    let mut controller = client_core::connect(config).context("invalid server url")?;
    let _renderer = render::spawn(&controller);

    println!("{}", input::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let cmd = match input::parse(&line) {
            Ok(Input::Empty) => continue,
            Ok(Input::Help) => {
                println!("{}", input::HELP);
                continue;
            }
            Ok(Input::Quit) => break,
            Ok(Input::Command(cmd)) => cmd,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        if let Some(hint) = input::hint(&cmd) {
            println!("hint: {hint}");
        }

        match dispatch(&mut controller, cmd).await {
            Ok(CommandOutcome::Operation(
                OperationResult::EncryptedText(_) | OperationResult::DecryptedText(_),
            )) => println!("{}", render::text_panel(&controller.text_view())),
            Ok(CommandOutcome::Downloaded(file)) => {
                let path = save_download(&args.download_dir, &file).await?;
                println!("saved {}", path.display());
            }
            Ok(CommandOutcome::Status(report)) => println!("{}", render::status_report(&report)),
            Ok(_) => {}
            // Already surfaced as a toast.
            Err(err) => tracing::debug!(error = %err, "command failed"),
        }
    }

    Ok(())
}

async fn save_download(root: &std::path::Path, file: &DownloadedFile) -> Result<PathBuf> {
    let dir = root.join(file.folder.as_str());
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("failed to create '{}'", dir.display()))?;
    let path = dir.join(&file.filename);
    tokio::fs::write(&path, &file.bytes)
        .await
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    tracing::info!(path = %path.display(), bytes = file.bytes.len(), "download saved");
    Ok(path)
}
