use clap::{Parser, Subcommand};
use fastdl_core::{FastDlConfig, SyncError};
use std::path::PathBuf;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "fastdl")]
#[command(
    author,
    version,
    about = "Mirror game server assets into a bzip2-compressed FastDL tree"
)]
#[command(after_help = "Examples:
  fastdl serve --port 3003
  fastdl run --sources-root /srv/games --output-root /var/www/fastdl
  fastdl --config ~/fastdl.toml serve")]
pub struct Config {
    /// Path to a fastdl.toml configuration file
    #[arg(short, long, global = true, env = "FASTDL_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory containing one folder per game server
    #[arg(long, global = true, env = "FASTDL_SOURCES_ROOT", value_name = "DIR")]
    pub sources_root: Option<PathBuf>,

    /// Directory the compressed download tree is written to
    #[arg(long, global = true, env = "FASTDL_OUTPUT_ROOT", value_name = "DIR")]
    pub output_root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the download tree and accept update requests over WebSocket
    #[command(after_help = "Example: fastdl serve --port 8080")]
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
    /// Run a single update now and exit
    Run,
}

impl Config {
    /// Loads the file configuration and applies command-line overrides.
    pub fn resolve(&self) -> Result<FastDlConfig, SyncError> {
        let mut resolved = FastDlConfig::load_or_default(self.config.as_deref())?;
        if let Some(dir) = &self.sources_root {
            resolved.sources_root = dir.clone();
        }
        if let Some(dir) = &self.output_root {
            resolved.output_root = dir.clone();
        }
        if let Command::Serve { port: Some(port), .. } = &self.command {
            resolved.port = *port;
        }
        resolved.validate()?;
        Ok(resolved)
    }
}
