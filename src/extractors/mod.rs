use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod direct_api;
pub mod page_scrape;
pub mod profiles;

pub use direct_api::DirectApiStrategy;
pub use page_scrape::PageScrapeStrategy;
pub use profiles::{ClientProfile, ClientSurface, CLIENT_PROFILES};

use crate::captions::{pick_track, CaptionFetcher};
use crate::ExtractionError;

/// Consent cookies that make the upstream render content instead of the EU consent wall
pub const CONSENT_COOKIE: &str = "SOCS=CAISNQgDEitib3FfaWRlbnRpdHlmcm9udGVuZHVpc2VydmVyXzIwMjMwODE1\
    LjA3X3AxGgJlbiACGgYIgJnOlwY; CONSENT=PENDING+987";

/// Caption body encodings the fetcher negotiates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionFormat {
    Json3,
    Srv3,
    /// Whatever the track serves without an explicit `fmt` parameter
    Default,
}

impl CaptionFormat {
    /// Order in which formats are attempted
    pub const NEGOTIATION_ORDER: [CaptionFormat; 3] =
        [CaptionFormat::Json3, CaptionFormat::Srv3, CaptionFormat::Default];

    /// Value for the `fmt` query parameter, `None` for the unformatted default
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            CaptionFormat::Json3 => Some("json3"),
            CaptionFormat::Srv3 => Some("srv3"),
            CaptionFormat::Default => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.query_value().unwrap_or("default")
    }
}

impl fmt::Display for CaptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caption track descriptor as listed in a player response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub language_code: String,

    /// `"asr"` marks machine-generated tracks
    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub name: Option<TrackName>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackName {
    #[serde(default)]
    pub simple_text: Option<String>,

    #[serde(default)]
    pub runs: Option<Vec<TextRun>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    #[serde(default)]
    pub text: Option<String>,
}

impl CaptionTrack {
    pub fn is_auto_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    /// Display name, falling back to the language code
    pub fn label(&self) -> String {
        let name = self.name.as_ref().and_then(|name| {
            name.simple_text.clone().or_else(|| {
                name.runs
                    .as_ref()
                    .and_then(|runs| runs.first())
                    .and_then(|run| run.text.clone())
            })
        });

        name.filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.language_code.clone())
    }
}

/// Upstream verdict on whether the video can be served
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayabilityStatus {
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub reason: Option<String>,
}

impl PlayabilityStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }

    /// Error describing a non-OK status
    pub fn rejection(&self) -> ExtractionError {
        let status = if self.status.is_empty() {
            "UNKNOWN".to_string()
        } else {
            self.status.clone()
        };
        let reason = self
            .reason
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| status.clone());

        ExtractionError::PlayabilityRejected { status, reason }
    }
}

/// The subset of a player response the strategies read
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    #[serde(default)]
    pub playability_status: Option<PlayabilityStatus>,

    #[serde(default)]
    pub captions: Option<Captions>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer", default)]
    pub renderer: Option<CaptionTracklist>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTracklist {
    #[serde(default)]
    pub caption_tracks: Option<Vec<CaptionTrack>>,
}

impl PlayerResponse {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Take the caption track list, treating an absent or empty list as "no captions"
    pub fn into_caption_tracks(self) -> Result<Vec<CaptionTrack>, ExtractionError> {
        self.captions
            .and_then(|captions| captions.renderer)
            .and_then(|renderer| renderer.caption_tracks)
            .filter(|tracks| !tracks.is_empty())
            .ok_or(ExtractionError::NoCaptionTracks)
    }
}

/// Track metadata echoed back with the caption content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub language_code: String,
    pub name: String,
    pub kind: Option<String>,
    pub is_generated: bool,
}

impl From<&CaptionTrack> for TrackSummary {
    fn from(track: &CaptionTrack) -> Self {
        Self {
            language_code: track.language_code.clone(),
            name: track.label(),
            kind: track.kind.clone(),
            is_generated: track.is_auto_generated(),
        }
    }
}

/// Successful resolution result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptPayload {
    pub video_id: String,

    /// The track whose content was fetched
    pub track: TrackSummary,

    /// Raw caption body, encoded per `format`
    pub content: String,

    pub format: CaptionFormat,

    /// Strategy (or client profile) that produced the tracks
    pub source_strategy: String,

    /// Number of tracks the strategy found
    pub track_count: usize,

    pub fetched_at: DateTime<Utc>,
}

/// One self-contained way of obtaining captions from the upstream
#[async_trait]
pub trait CaptionStrategy: Send + Sync {
    /// Identifier used in logs, diagnostics and `source_strategy`
    fn name(&self) -> &str;

    /// Attempt to produce a transcript for `video_id`
    async fn try_extract(
        &self,
        video_id: &str,
        credentials: Option<&str>,
    ) -> Result<TranscriptPayload, ExtractionError>;
}

/// Cookie header value: caller credentials (if any) followed by the consent cookies
pub fn build_cookie_header(credentials: Option<&str>) -> String {
    match credentials.map(str::trim).filter(|c| !c.is_empty()) {
        Some(creds) => format!("{}; {}", creds.trim_end_matches(';'), CONSENT_COOKIE),
        None => CONSENT_COOKIE.to_string(),
    }
}

/// Headers shared by browser-style requests
pub(crate) fn browser_headers(
    user_agent: &str,
    accept_language: &str,
    cookie: Option<&str>,
) -> Result<HeaderMap, ExtractionError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value(user_agent)?);
    headers.insert(ACCEPT_LANGUAGE, header_value(accept_language)?);
    if let Some(cookie) = cookie {
        headers.insert(COOKIE, header_value(cookie)?);
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, ExtractionError> {
    HeaderValue::from_str(value).map_err(|_| {
        ExtractionError::InvalidRequest(format!("unusable header value ({} bytes)", value.len()))
    })
}

/// Pick a track from one strategy's list and download its content
pub(crate) async fn fetch_from_tracks(
    fetcher: &CaptionFetcher,
    video_id: &str,
    tracks: &[CaptionTrack],
    source: &str,
) -> Result<TranscriptPayload, ExtractionError> {
    let track = pick_track(tracks).ok_or(ExtractionError::NoCaptionTracks)?;

    tracing::info!(
        "[{}] {}: {} caption tracks, using {} ({})",
        video_id,
        source,
        tracks.len(),
        track.language_code,
        if track.is_auto_generated() { "auto" } else { "manual" }
    );

    let fetched = fetcher.fetch(track).await?;

    Ok(TranscriptPayload {
        video_id: video_id.to_string(),
        track: TrackSummary::from(track),
        content: fetched.content,
        format: fetched.format,
        source_strategy: source.to_string(),
        track_count: tracks.len(),
        fetched_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER_JSON: &str = r#"{
        "playabilityStatus": {"status": "OK"},
        "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
            {"baseUrl": "https://www.youtube.com/api/timedtext?v=x&lang=en",
             "name": {"runs": [{"text": "English"}]}, "languageCode": "en"},
            {"baseUrl": "https://www.youtube.com/api/timedtext?v=x&lang=es&kind=asr",
             "name": {"simpleText": "Spanish (auto-generated)"},
             "languageCode": "es", "kind": "asr", "isTranslatable": true}
        ]}}
    }"#;

    #[test]
    fn test_parse_player_response() {
        let response = PlayerResponse::parse(PLAYER_JSON).unwrap();
        assert!(response.playability_status.as_ref().unwrap().is_ok());

        let tracks = response.into_caption_tracks().unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].label(), "English");
        assert!(!tracks[0].is_auto_generated());
        assert_eq!(tracks[1].label(), "Spanish (auto-generated)");
        assert!(tracks[1].is_auto_generated());
    }

    #[test]
    fn test_missing_or_empty_tracks() {
        let response = PlayerResponse::parse(r#"{"playabilityStatus": {"status": "OK"}}"#).unwrap();
        assert_eq!(response.into_caption_tracks(), Err(ExtractionError::NoCaptionTracks));

        let response = PlayerResponse::parse(
            r#"{"captions": {"playerCaptionsTracklistRenderer": {"captionTracks": []}}}"#,
        )
        .unwrap();
        assert_eq!(response.into_caption_tracks(), Err(ExtractionError::NoCaptionTracks));
    }

    #[test]
    fn test_rejection_prefers_reason() {
        let status = PlayabilityStatus {
            status: "ERROR".to_string(),
            reason: Some("Video unavailable".to_string()),
        };
        assert_eq!(
            status.rejection(),
            ExtractionError::PlayabilityRejected {
                status: "ERROR".to_string(),
                reason: "Video unavailable".to_string(),
            }
        );

        let status = PlayabilityStatus {
            status: "LOGIN_REQUIRED".to_string(),
            reason: None,
        };
        assert!(status.rejection().to_string().contains("LOGIN_REQUIRED"));
    }

    #[test]
    fn test_cookie_header() {
        assert_eq!(build_cookie_header(None), CONSENT_COOKIE);
        assert_eq!(build_cookie_header(Some("  ")), CONSENT_COOKIE);
        assert_eq!(
            build_cookie_header(Some("SID=abc;")),
            format!("SID=abc; {}", CONSENT_COOKIE)
        );
    }

    #[test]
    fn test_format_names() {
        assert_eq!(CaptionFormat::Json3.to_string(), "json3");
        assert_eq!(CaptionFormat::Default.query_value(), None);
        assert_eq!(serde_json::to_value(CaptionFormat::Default).unwrap(), "default");
    }

    #[test]
    fn test_invalid_cookie_is_rejected() {
        let result = browser_headers("ua", "en", Some("bad\nvalue"));
        assert!(matches!(result, Err(ExtractionError::InvalidRequest(_))));
    }
}
