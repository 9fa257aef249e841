use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod atomic;
mod config;
mod rewriter;

use config::RewriteConfig;
use rewriter::LogoRewriter;

#[derive(Parser)]
#[command(name = "fix-logo")]
#[command(about = "Replace the inlined base64 logo in the auth route with the hosted logo URL")]
struct Cli {
    /// File to rewrite in place
    #[arg(long, value_name = "PATH", default_value = config::DEFAULT_TARGET)]
    target: PathBuf,

    /// Report what would change without writing the file
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Debug)]
struct RunSummary {
    replacements: usize,
    written: bool,
}

fn init_tracing(debug: bool) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if debug {
        filter = filter.add_directive(tracing::Level::DEBUG.into());
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(config: &RewriteConfig, dry_run: bool) -> Result<RunSummary> {
    config.validate().context("Invalid rewrite configuration")?;
    let rewriter = LogoRewriter::new(config)?;

    tracing::debug!("Reading {}", config.target.display());
    let content = atomic::read_text(&config.target)?;

    for image in rewriter.inline_images(&content) {
        match &image.decoded {
            Some(bytes) if image.is_png() => tracing::debug!(
                "Inline logo at byte {}: {} base64 chars, {} byte PNG",
                image.offset,
                image.payload_len,
                bytes.len()
            ),
            Some(_) => tracing::warn!(
                "Inline logo at byte {} does not decode to a PNG, replacing anyway",
                image.offset
            ),
            None => tracing::warn!(
                "Inline logo at byte {} has an invalid base64 payload, replacing anyway",
                image.offset
            ),
        }
    }

    let rewrite = rewriter.rewrite(&content);
    tracing::info!(
        "Replaced {} inline logo tag(s) in {}",
        rewrite.replacements,
        config.target.display()
    );

    if dry_run {
        return Ok(RunSummary {
            replacements: rewrite.replacements,
            written: false,
        });
    }

    // A document with no matches is still written back unchanged
    if !rewrite.changed() {
        tracing::debug!("No inline logo found, writing contents back as-is");
    }
    atomic::write_text(&config.target, &rewrite.content)?;
    tracing::debug!(
        "Wrote {} bytes to {}",
        rewrite.content.len(),
        config.target.display()
    );

    Ok(RunSummary {
        replacements: rewrite.replacements,
        written: true,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = RewriteConfig::with_target(&cli.target);
    let summary = run(&config, cli.dry_run)?;

    if summary.written {
        println!("✅ Logo URL updated in {}", config.display_name());
    } else {
        println!(
            "🔍 Dry run: {} inline logo tag(s) would be replaced in {}",
            summary.replacements,
            config.display_name()
        );
    }

    Ok(())
}
