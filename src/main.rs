use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stylescope::config::{load_config, LoadedConfig};
use stylescope::{info::build_info, init_logging, keyframes, keyframes_from_css};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "stylescope", version, about = "Design measurement toolkit")]
struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level; overrides the configured one
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract @keyframes from every stylesheet in a directory
    Keyframes {
        dir: PathBuf,

        #[arg(long, default_value_t = 200)]
        limit: usize,

        /// Write the envelope here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the effective configuration as YAML
    Policy,
    /// Print build information
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let LoadedConfig { config, path } = load_config(cli.config.as_deref()).await?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(level, cli.debug, config.log_json)?;
    if let Some(path) = &path {
        info!(path = %path.display(), "configuration loaded");
    }

    let outcome = match cli.command {
        Command::Keyframes { dir, limit, out } => {
            let sources = keyframes::read_css_dir(&dir).await?;
            info!(files = sources.len(), limit, "extracting keyframes");
            let rendered = serde_json::to_string_pretty(&keyframes_from_css(&sources, limit))?;
            match out {
                Some(out) => tokio::fs::write(&out, rendered)
                    .await
                    .with_context(|| format!("Failed to write {}", out.display())),
                None => {
                    println!("{rendered}");
                    Ok(())
                }
            }
        }
        Command::Policy => serde_yaml::to_string(&config)
            .map(|yaml| print!("{yaml}"))
            .context("Failed to render configuration"),
        Command::Info => serde_json::to_string_pretty(&build_info())
            .map(|json| println!("{json}"))
            .context("Failed to render build info"),
    };

    if let Err(err) = &outcome {
        error!("Command failed: {:#}", err);
    }
    outcome
}
