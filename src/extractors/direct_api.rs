use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::json;
use std::sync::Arc;

use super::profiles::{ClientProfile, CHROME_USER_AGENT};
use super::{
    browser_headers, build_cookie_header, fetch_from_tracks, CaptionStrategy, PlayerResponse,
    TranscriptPayload,
};
use crate::captions::CaptionFetcher;
use crate::http::HttpTransport;
use crate::ExtractionError;

/// Calls the InnerTube player endpoint directly while impersonating one client profile
pub struct DirectApiStrategy {
    transport: Arc<dyn HttpTransport>,
    profile: &'static ClientProfile,
    accept_language: String,
}

impl DirectApiStrategy {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        profile: &'static ClientProfile,
        accept_language: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            profile,
            accept_language: accept_language.into(),
        }
    }

    /// Request body for the player endpoint
    pub fn player_request(&self, video_id: &str) -> serde_json::Value {
        json!({
            "context": self.profile.context(),
            "videoId": video_id,
        })
    }
}

#[async_trait]
impl CaptionStrategy for DirectApiStrategy {
    fn name(&self) -> &str {
        self.profile.name
    }

    async fn try_extract(
        &self,
        video_id: &str,
        credentials: Option<&str>,
    ) -> Result<TranscriptPayload, ExtractionError> {
        // Mobile clients authenticate differently upstream, so no cookie at all
        let cookie = self
            .profile
            .sends_cookies()
            .then(|| build_cookie_header(credentials));

        let mut headers =
            browser_headers(self.profile.user_agent, &self.accept_language, cookie.as_deref())?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .transport
            .post_json(&self.profile.player_url(), &headers, &self.player_request(video_id))
            .await?;
        tracing::debug!(
            "[{}] {} player: status={}",
            video_id,
            self.profile.name,
            response.status
        );

        if !response.is_success() {
            return Err(ExtractionError::HttpStatus(response.status));
        }

        let player = PlayerResponse::parse(&response.body)
            .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;

        match &player.playability_status {
            Some(status) if status.is_ok() => {}
            Some(status) => return Err(status.rejection()),
            None => {
                return Err(ExtractionError::PlayabilityRejected {
                    status: "MISSING".to_string(),
                    reason: "response has no playability status".to_string(),
                })
            }
        }

        let tracks = player.into_caption_tracks()?;

        // Consent cookies always; the session cookie only where the player call carried it
        let caption_cookie =
            build_cookie_header(credentials.filter(|_| self.profile.sends_cookies()));
        let fetcher = CaptionFetcher::new(
            self.transport.clone(),
            browser_headers(CHROME_USER_AGENT, &self.accept_language, Some(&caption_cookie))?,
        );
        fetch_from_tracks(&fetcher, video_id, &tracks, self.profile.name).await
    }
}
