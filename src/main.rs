use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidscript::cli::{Cli, Commands};
use vidscript::config::Config;
use vidscript::output::{self, TranscriptDocument};
use vidscript::transcribe::Pipeline;
use vidscript::utils;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "vidscript=debug"
    } else {
        "vidscript=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load().await?;

    match cli.command {
        Commands::Transcribe {
            source,
            output_dir,
            keep_audio,
            model_size,
        } => {
            if let Some(size) = model_size {
                config.whisper.model_size = size;
            }

            // Check for required external tools (non-fatal: a captions-only
            // run needs nothing beyond yt-dlp)
            let missing = utils::check_dependencies(&config.whisper.binary).await;
            if !missing.is_empty() {
                eprintln!("Dependency check warnings:");
                for dep in missing {
                    eprintln!("  - {}", dep);
                }
                eprintln!("  (Continuing anyway - tools may not be needed for this run)");
            }

            let output_dir = config.resolve_output_dir(output_dir);
            let keep_audio = keep_audio || config.app.keep_audio;

            tracing::info!("Processing source: {}", source);

            let pipeline = Pipeline::new(&config);
            let result = pipeline.run(&source, &output_dir, keep_audio).await?;

            if let Some(last) = result.transcript.segments.last() {
                tracing::info!(
                    "Transcript covers {} across {} segments",
                    utils::format_duration(last.end),
                    result.transcript.segments.len()
                );
            }

            let document = TranscriptDocument::new(result, &source);
            let path = output::save_document(&document, &output_dir)?;

            // Print the document path to stdout for callers to pick up
            println!("{}", path.display());
            tracing::info!("Transcript saved to: {}", path.display());
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                config.interactive_setup().await?;
            }
        }
        Commands::Platforms => {
            println!("Supported platforms:");
            println!("  - YouTube (youtube.com, youtu.be)");
            println!("  - Bilibili (bilibili.com, b23.tv)");
            println!("  - Local audio/video files (anything ffmpeg can read)");
        }
    }

    Ok(())
}
