use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::extractors::TranscriptPayload;
use crate::resolver::ResolveError;

/// Error body printed when no transcript could be resolved
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub details: Vec<String>,
}

impl From<&ResolveError> for ErrorEnvelope {
    fn from(err: &ResolveError) -> Self {
        Self {
            error: err.to_string(),
            details: err.details(),
        }
    }
}

/// Render a payload in the requested format
pub fn render(payload: &TranscriptPayload, format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(payload, pretty),
        OutputFormat::Raw => Ok(payload.content.clone()),
    }
}

/// Render the error envelope as JSON
pub fn render_error(err: &ResolveError, pretty: bool) -> Result<String> {
    to_json(&ErrorEnvelope::from(err), pretty)
}

/// Save a transcript to file
pub async fn save_to_file(
    payload: &TranscriptPayload,
    path: &Path,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    let content = render(payload, format, pretty)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print a transcript to stdout
pub fn print_to_console(
    payload: &TranscriptPayload,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    let content = render(payload, format, pretty)?;
    println!("{}", content);
    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{CaptionFormat, TrackSummary};
    use crate::resolver::StrategyFailure;
    use chrono::Utc;

    fn payload() -> TranscriptPayload {
        TranscriptPayload {
            video_id: "dQw4w9WgXcQ".to_string(),
            track: TrackSummary {
                language_code: "en".to_string(),
                name: "English".to_string(),
                kind: None,
                is_generated: false,
            },
            content: "<timedtext/>".to_string(),
            format: CaptionFormat::Srv3,
            source_strategy: "ANDROID".to_string(),
            track_count: 3,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_json() {
        let json = render(&payload(), OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["format"], "srv3");
        assert_eq!(value["source_strategy"], "ANDROID");
        assert_eq!(value["track"]["language_code"], "en");
        assert_eq!(value["track_count"], 3);
    }

    #[test]
    fn test_render_raw_is_passthrough() {
        assert_eq!(render(&payload(), OutputFormat::Raw, true).unwrap(), "<timedtext/>");
    }

    #[test]
    fn test_render_error() {
        let err = ResolveError::AllStrategiesFailed {
            failures: vec![StrategyFailure {
                strategy: "IOS".to_string(),
                error: "HTTP 403".to_string(),
            }],
            credentials_supplied: true,
        };
        let rendered = render_error(&err, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["details"][0], "IOS: HTTP 403");
        assert!(value["error"].as_str().unwrap().contains("IOS: HTTP 403"));
    }

    #[tokio::test]
    async fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions.xml");
        save_to_file(&payload(), &path, OutputFormat::Raw, false).await.unwrap();
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "<timedtext/>");
    }
}
