//! Caption Resolver - resolve YouTube captions for a video id
//!
//! This library tries a fixed, ordered list of extraction strategies (watch-page scraping and
//! direct InnerTube player calls under several client identities) until one of them yields a
//! caption track whose content can be downloaded.

pub mod captions;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod extractors;
pub mod http;
pub mod output;
pub mod resolver;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use credentials::CredentialSource;
pub use extractors::{CaptionFormat, CaptionStrategy, CaptionTrack, TranscriptPayload};
pub use http::{HttpResponse, HttpTransport, ReqwestTransport};
pub use resolver::{ResolveError, TranscriptResolver};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Failures a single extraction strategy can report
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("request could not be built: {0}")]
    InvalidRequest(String),

    #[error("bot detection triggered")]
    BotChallenge,

    #[error("player response marker not found in page")]
    MissingDataMarker,

    #[error("could not extract player response: {0}")]
    JsonExtraction(String),

    #[error("invalid player response: {0}")]
    InvalidResponse(String),

    #[error("playability {status}: {reason}")]
    PlayabilityRejected { status: String, reason: String },

    #[error("no caption tracks")]
    NoCaptionTracks,

    #[error("caption track has no URL")]
    MissingTrackUrl,

    #[error("all caption format fetches failed")]
    AllFormatsFailed,
}
