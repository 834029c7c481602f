use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caption_resolver::cli::{Cli, Commands, OutputFormat};
use caption_resolver::{output, utils, Config, CredentialSource, TranscriptResolver};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    let mut config = Config::load().await?;

    match cli.command {
        Commands::Fetch {
            video,
            output: output_path,
            format,
            cookie,
            proxy,
            timeout,
        } => {
            if let Some(proxy) = proxy {
                config.http.proxy = Some(proxy);
            }
            if let Some(timeout) = timeout {
                config.http.timeout_secs = timeout;
            }
            config.validate()?;

            let video_id = utils::extract_video_id(&video)
                .ok_or_else(|| anyhow::anyhow!("Invalid YouTube URL or video id: {:?}", video))?;
            let credentials = CredentialSource::new(cookie, &config.credentials).cookie();
            let format =
                format.unwrap_or_else(|| OutputFormat::from_config(&config.output.default_format));
            let pretty = config.output.pretty;

            let resolver = TranscriptResolver::from_config(&config)?;

            tracing::info!(
                "=== Transcript request: video={} cookie={} ===",
                video_id,
                credentials.is_some()
            );

            let progress = (!cli.quiet).then(|| spinner(&video_id));
            let result = resolver.resolve(&video_id, credentials.as_deref()).await;
            if let Some(progress) = progress {
                progress.finish_and_clear();
            }

            match result {
                Ok(payload) => match output_path {
                    Some(path) => {
                        output::save_to_file(&payload, &path, format, pretty).await?;
                        eprintln!("Captions saved to: {}", path.display());
                    }
                    None => output::print_to_console(&payload, format, pretty)?,
                },
                Err(err) => {
                    println!("{}", output::render_error(&err, pretty)?);
                    std::process::exit(1);
                }
            }
        }
        Commands::Strategies => {
            let resolver = TranscriptResolver::from_config(&config)?;
            println!("Strategies (tried in order):");
            for (index, name) in resolver.strategy_names().iter().enumerate() {
                println!("  {}. {}", index + 1, name);
            }
            if let Some(proxy) = &config.http.proxy {
                println!("Proxy: {}", proxy);
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Edit the config file to change settings:");
                println!("  {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "caption_resolver=debug"
    } else {
        "caption_resolver=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn spinner(video_id: &str) -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message(format!("Resolving captions for {}...", video_id));
    progress.enable_steady_tick(Duration::from_millis(120));
    progress
}
