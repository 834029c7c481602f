use async_trait::async_trait;
use std::sync::Arc;

use super::profiles::CHROME_USER_AGENT;
use super::{
    browser_headers, build_cookie_header, fetch_from_tracks, CaptionStrategy, PlayerResponse,
    TranscriptPayload,
};
use crate::captions::CaptionFetcher;
use crate::http::HttpTransport;
use crate::utils::extract_balanced_json;
use crate::ExtractionError;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Marks the script assignment holding the embedded player response
pub const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse";

/// Maximum distance between the marker and the opening brace
const MAX_MARKER_GAP: usize = 32;

/// Matched against the lowercased page, with both apostrophe forms
const BOT_CHALLENGE_PHRASES: [&str; 3] = [
    "confirm you're not a bot",
    "confirm you\u{2019}re not a bot",
    "detected unusual traffic",
];

/// Scrapes the watch page and reads the embedded player response
pub struct PageScrapeStrategy {
    transport: Arc<dyn HttpTransport>,
    accept_language: String,
    forward_credentials: bool,
    name: &'static str,
}

impl PageScrapeStrategy {
    /// Variant that sends the caller's cookie along with the consent cookies
    pub fn new(transport: Arc<dyn HttpTransport>, accept_language: impl Into<String>) -> Self {
        Self {
            transport,
            accept_language: accept_language.into(),
            forward_credentials: true,
            name: "page-scrape",
        }
    }

    /// Variant that ignores caller credentials, for when a stale cookie poisons the page
    pub fn anonymous(
        transport: Arc<dyn HttpTransport>,
        accept_language: impl Into<String>,
    ) -> Self {
        Self {
            forward_credentials: false,
            name: "page-scrape (anonymous)",
            ..Self::new(transport, accept_language)
        }
    }
}

#[async_trait]
impl CaptionStrategy for PageScrapeStrategy {
    fn name(&self) -> &str {
        self.name
    }

    async fn try_extract(
        &self,
        video_id: &str,
        credentials: Option<&str>,
    ) -> Result<TranscriptPayload, ExtractionError> {
        let credentials = credentials.filter(|_| self.forward_credentials);
        let cookie = build_cookie_header(credentials);
        let headers = browser_headers(CHROME_USER_AGENT, &self.accept_language, Some(&cookie))?;

        let url = format!("{}{}", WATCH_URL, urlencoding::encode(video_id));
        let response = self.transport.get(&url, &headers).await?;
        tracing::debug!(
            "[{}] Watch page: status={} len={}",
            video_id,
            response.status,
            response.body.len()
        );

        if !response.is_success() {
            return Err(ExtractionError::HttpStatus(response.status));
        }

        let player = parse_watch_page(&response.body)?;

        if let Some(status) = &player.playability_status {
            if !status.is_ok() {
                return Err(status.rejection());
            }
        }

        let tracks = player.into_caption_tracks()?;

        let fetcher = CaptionFetcher::new(self.transport.clone(), headers);
        fetch_from_tracks(&fetcher, video_id, &tracks, self.name).await
    }
}

/// Locate and parse the player response embedded in a watch page
pub fn parse_watch_page(html: &str) -> Result<PlayerResponse, ExtractionError> {
    let lowered = html.to_lowercase();
    if BOT_CHALLENGE_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        return Err(ExtractionError::BotChallenge);
    }

    let marker = html
        .find(PLAYER_RESPONSE_MARKER)
        .ok_or(ExtractionError::MissingDataMarker)?;
    let after_marker = marker + PLAYER_RESPONSE_MARKER.len();
    let window_end = html.len().min(after_marker + MAX_MARKER_GAP);

    let brace = html.as_bytes()[after_marker..window_end]
        .iter()
        .position(|&b| b == b'{')
        .map(|offset| after_marker + offset)
        .ok_or_else(|| {
            ExtractionError::JsonExtraction("player response brace too far from marker".to_string())
        })?;

    let json = extract_balanced_json(html, brace).ok_or_else(|| {
        ExtractionError::JsonExtraction("player response object is not balanced".to_string())
    })?;

    PlayerResponse::parse(json).map_err(|e| ExtractionError::JsonExtraction(e.to_string()))
}
