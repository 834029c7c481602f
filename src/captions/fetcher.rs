use reqwest::header::HeaderMap;
use std::sync::Arc;

use crate::extractors::{CaptionFormat, CaptionTrack};
use crate::http::HttpTransport;
use crate::utils::{strip_expiry_flag, with_format};
use crate::ExtractionError;

/// Caption body together with the format that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedCaptions {
    pub content: String,
    pub format: CaptionFormat,
}

/// Downloads caption content, negotiating json3 → srv3 → default
pub struct CaptionFetcher {
    transport: Arc<dyn HttpTransport>,
    headers: HeaderMap,
}

impl CaptionFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, headers: HeaderMap) -> Self {
        Self { transport, headers }
    }

    /// Fetch the first format whose response passes validation
    pub async fn fetch(&self, track: &CaptionTrack) -> Result<FetchedCaptions, ExtractionError> {
        if track.base_url.trim().is_empty() {
            return Err(ExtractionError::MissingTrackUrl);
        }

        // Stripped URL first; the signed original only when stripping changed it
        let stripped = strip_expiry_flag(&track.base_url);
        let mut variants = vec![("no-exp", stripped.as_str())];
        if stripped != track.base_url {
            variants.push(("original", track.base_url.as_str()));
        }

        for (variant, base_url) in variants {
            if let Some(fetched) = self.negotiate(base_url, variant).await {
                return Ok(fetched);
            }
        }

        Err(ExtractionError::AllFormatsFailed)
    }

    async fn negotiate(&self, base_url: &str, variant: &str) -> Option<FetchedCaptions> {
        for format in CaptionFormat::NEGOTIATION_ORDER {
            let url = with_format(base_url, format.query_value());
            match self.try_format(&url, format).await {
                Ok(content) => {
                    tracing::debug!(
                        "Caption format {} accepted via {} URL ({} bytes)",
                        format,
                        variant,
                        content.len()
                    );
                    return Some(FetchedCaptions { content, format });
                }
                Err(reason) => {
                    tracing::debug!(
                        "Caption format {} skipped ({} URL): {}",
                        format,
                        variant,
                        reason
                    );
                }
            }
        }
        None
    }

    async fn try_format(&self, url: &str, format: CaptionFormat) -> Result<String, String> {
        let response = self
            .transport
            .get(url, &self.headers)
            .await
            .map_err(|e| e.to_string())?;

        if !response.is_success() {
            return Err(format!("HTTP {}", response.status));
        }

        if response.body.trim().is_empty() {
            return Err("empty body".to_string());
        }

        if format == CaptionFormat::Json3 && !has_caption_events(&response.body) {
            return Err("json3 payload has no events".to_string());
        }

        Ok(response.body)
    }
}

/// Valid JSON with a non-empty `events` array
fn has_caption_events(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("events").and_then(|e| e.as_array()).map(|e| !e.is_empty()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, MockHttpTransport};

    const SRV3_BODY: &str = r#"<?xml version="1.0" encoding="utf-8" ?><timedtext format="3">
<body><p t="0" d="1500">Hello</p></body></timedtext>"#;

    fn track(base_url: &str) -> CaptionTrack {
        CaptionTrack {
            base_url: base_url.to_string(),
            language_code: "en".to_string(),
            ..CaptionTrack::default()
        }
    }

    fn fetcher(mock: MockHttpTransport) -> CaptionFetcher {
        CaptionFetcher::new(Arc::new(mock), HeaderMap::new())
    }

    #[tokio::test]
    async fn test_json3_accepted_first() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|url, _| url.ends_with("&fmt=json3"))
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(200, r#"{"events": [{"tStartMs": 0}]}"#)));

        let fetched = fetcher(mock)
            .fetch(&track("https://www.youtube.com/api/timedtext?v=x&lang=en"))
            .await
            .unwrap();
        assert_eq!(fetched.format, CaptionFormat::Json3);
        assert!(fetched.content.contains("tStartMs"));
    }

    #[tokio::test]
    async fn test_falls_through_to_srv3() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|url, _| url.ends_with("fmt=json3"))
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(500, "")));
        mock.expect_get()
            .withf(|url, _| url.ends_with("fmt=srv3"))
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(200, SRV3_BODY)));
        mock.expect_get()
            .withf(|url, _| !url.contains("fmt="))
            .never();

        let fetched = fetcher(mock)
            .fetch(&track("https://www.youtube.com/api/timedtext?v=x&lang=en"))
            .await
            .unwrap();
        assert_eq!(fetched.format, CaptionFormat::Srv3);
        assert_eq!(fetched.content, SRV3_BODY);
    }

    #[tokio::test]
    async fn test_empty_json3_events_are_skipped() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|url, _| url.ends_with("fmt=json3"))
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(200, r#"{"wireMagic": "pb3", "events": []}"#)));
        mock.expect_get()
            .withf(|url, _| url.ends_with("fmt=srv3"))
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(200, "  \n")));
        mock.expect_get()
            .withf(|url, _| !url.contains("fmt="))
            .times(1)
            .returning(|_, _| {
                Ok(HttpResponse::new(200, r#"<transcript><text start="0">Hi</text></transcript>"#))
            });

        let fetched = fetcher(mock)
            .fetch(&track("https://www.youtube.com/api/timedtext?v=x&fmt=srv1&lang=en"))
            .await
            .unwrap();
        assert_eq!(fetched.format, CaptionFormat::Default);
    }

    #[tokio::test]
    async fn test_all_formats_failed() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .times(3)
            .returning(|_, _| Err(ExtractionError::Network("connection reset".to_string())));

        let result = fetcher(mock)
            .fetch(&track("https://www.youtube.com/api/timedtext?v=x"))
            .await;
        assert_eq!(result, Err(ExtractionError::AllFormatsFailed));
    }

    #[tokio::test]
    async fn test_expiry_flag_stripped_before_fetch() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|url, _| {
                url == "https://www.youtube.com/api/timedtext?v=x&sparams=ip,expire&fmt=json3"
            })
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(200, r#"{"events": [{}]}"#)));

        let fetched = fetcher(mock)
            .fetch(&track(
                "https://www.youtube.com/api/timedtext?v=x&exp=xpe&sparams=ip,expire,exp",
            ))
            .await
            .unwrap();
        assert_eq!(fetched.format, CaptionFormat::Json3);
    }

    #[tokio::test]
    async fn test_signed_url_tried_after_stripped_url() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|url, _| !url.contains("exp=xpe"))
            .times(3)
            .returning(|_, _| Ok(HttpResponse::new(200, "")));
        mock.expect_get()
            .withf(|url, _| url.contains("exp=xpe") && url.ends_with("fmt=json3"))
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(200, r#"{"events": [{"tStartMs": 0}]}"#)));

        let fetched = fetcher(mock)
            .fetch(&track("https://www.youtube.com/api/timedtext?v=x&exp=xpe&sparams=ip,exp"))
            .await
            .unwrap();
        assert_eq!(fetched.format, CaptionFormat::Json3);
    }

    #[tokio::test]
    async fn test_unsigned_url_tried_once() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .times(3)
            .returning(|_, _| Ok(HttpResponse::new(404, "")));

        let result = fetcher(mock)
            .fetch(&track("https://www.youtube.com/api/timedtext?v=x&lang=en"))
            .await;
        assert_eq!(result, Err(ExtractionError::AllFormatsFailed));
    }

    #[tokio::test]
    async fn test_missing_base_url() {
        let mock = MockHttpTransport::new();
        let result = fetcher(mock).fetch(&track("")).await;
        assert_eq!(result, Err(ExtractionError::MissingTrackUrl));
    }
}
