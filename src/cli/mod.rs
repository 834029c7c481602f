use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "captions",
    about = "Caption Resolver - Fetch YouTube captions without the official API",
    version,
    long_about = "Resolves caption tracks for a YouTube video by trying the watch page and \
                  several InnerTube player clients in turn, then downloads the best English \
                  track as json3, srv3 or the track's default format."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch captions for a video id or URL
    Fetch {
        /// Video id or YouTube URL (watch, youtu.be, shorts, embed)
        #[arg(value_name = "VIDEO_OR_URL")]
        video: String,

        /// Output file path (prints to stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Cookie header from a logged-in browser session
        #[arg(long, env = "YOUTUBE_COOKIE", hide_env_values = true)]
        cookie: Option<String>,

        /// HTTP/SOCKS proxy for all upstream requests
        #[arg(long, env = "PROXY_URL")]
        proxy: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// List the extraction strategies in the order they are tried
    Strategies,

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Full result as JSON (track, format, source strategy, content)
    Json,
    /// Caption body exactly as served
    Raw,
}

impl OutputFormat {
    pub fn from_config(value: &str) -> Self {
        match value {
            "raw" => OutputFormat::Raw,
            _ => OutputFormat::Json,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Raw => write!(f, "raw"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::try_parse_from([
            "captions", "fetch", "dQw4w9WgXcQ", "--format", "raw", "--timeout", "5", "-q",
        ])
        .unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Fetch { video, format, timeout, .. } => {
                assert_eq!(video, "dQw4w9WgXcQ");
                assert_eq!(format, Some(OutputFormat::Raw));
                assert_eq!(timeout, Some(5));
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn test_fetch_requires_video() {
        assert!(Cli::try_parse_from(["captions", "fetch"]).is_err());
    }
}
