use futures_util::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::config::Config;
use crate::extractors::{
    CaptionStrategy, DirectApiStrategy, PageScrapeStrategy, TranscriptPayload, CLIENT_PROFILES,
};
use crate::http::{HttpTransport, ReqwestTransport};

/// One strategy's diagnostic after it failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy: String,
    pub error: String,
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.error)
    }
}

/// Why a resolution produced no transcript
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("video id must not be empty")]
    InvalidVideoId,

    #[error("{}", describe_failures(.failures, .credentials_supplied))]
    AllStrategiesFailed {
        failures: Vec<StrategyFailure>,
        credentials_supplied: bool,
    },
}

impl ResolveError {
    /// Individual diagnostics, one per strategy
    pub fn details(&self) -> Vec<String> {
        match self {
            ResolveError::InvalidVideoId => Vec::new(),
            ResolveError::AllStrategiesFailed { failures, .. } => {
                failures.iter().map(ToString::to_string).collect()
            }
        }
    }
}

fn describe_failures(failures: &[StrategyFailure], credentials_supplied: &bool) -> String {
    let joined = failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");

    let mut message = format!(
        "Could not fetch transcript. The video may not have captions, \
         or YouTube blocked the request. [{}]",
        joined
    );
    if !*credentials_supplied {
        message.push_str(
            " Hint: no session cookie was supplied; \
             providing one from a logged-in browser often gets past bot checks.",
        );
    }
    message
}

/// Tries every registered strategy in order until one returns a transcript
pub struct TranscriptResolver {
    strategies: Vec<Box<dyn CaptionStrategy>>,
}

impl TranscriptResolver {
    /// Resolver with an explicit strategy list, tried in the given order
    pub fn with_strategies(strategies: Vec<Box<dyn CaptionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Resolver over the default strategy order using a reqwest transport
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(&config.http)?);
        Ok(Self::with_transport(transport, &config.http.accept_language))
    }

    /// Default order: scrape with cookie, WEB player with cookie, mobile players, anonymous scrape
    pub fn with_transport(transport: Arc<dyn HttpTransport>, accept_language: &str) -> Self {
        let mut strategies: Vec<Box<dyn CaptionStrategy>> =
            vec![Box::new(PageScrapeStrategy::new(transport.clone(), accept_language))];
        for profile in CLIENT_PROFILES {
            strategies.push(Box::new(DirectApiStrategy::new(
                transport.clone(),
                profile,
                accept_language,
            )));
        }
        strategies.push(Box::new(PageScrapeStrategy::anonymous(transport, accept_language)));

        Self::with_strategies(strategies)
    }

    /// Names of the registered strategies, in attempt order
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|strategy| strategy.name()).collect()
    }

    /// Resolve captions for `video_id`, optionally with a session cookie
    pub async fn resolve(
        &self,
        video_id: &str,
        credentials: Option<&str>,
    ) -> Result<TranscriptPayload, ResolveError> {
        let video_id = video_id.trim();
        if video_id.is_empty() {
            return Err(ResolveError::InvalidVideoId);
        }

        let credentials = credentials.map(str::trim).filter(|c| !c.is_empty());
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            tracing::info!("[{}] Trying: {}", video_id, strategy.name());

            let attempt = AssertUnwindSafe(strategy.try_extract(video_id, credentials))
                .catch_unwind()
                .await;

            let error = match attempt {
                Ok(Ok(payload)) => {
                    tracing::info!(
                        "[{}] Success via {} ({} format, {} bytes)",
                        video_id,
                        payload.source_strategy,
                        payload.format,
                        payload.content.len()
                    );
                    return Ok(payload);
                }
                Ok(Err(e)) => e.to_string(),
                Err(panic) => format!("strategy crashed: {}", panic_message(panic.as_ref())),
            };

            tracing::warn!("[{}] {} failed: {}", video_id, strategy.name(), error);
            failures.push(StrategyFailure {
                strategy: strategy.name().to_string(),
                error,
            });
        }

        let err = ResolveError::AllStrategiesFailed {
            failures,
            credentials_supplied: credentials.is_some(),
        };
        tracing::warn!("[{}] All strategies failed: {:?}", video_id, err.details());
        Err(err)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
