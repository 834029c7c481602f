use crate::extractors::CaptionTrack;

const PREFERRED_LANGUAGE: &str = "en";

/// Choose the caption track to download.
///
/// Tiers, each scanned in list order: manual English, any English, any `en-*` variant, then
/// the first track. `None` only for an empty list.
pub fn pick_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.language_code == PREFERRED_LANGUAGE && !t.is_auto_generated())
        .or_else(|| tracks.iter().find(|t| t.language_code == PREFERRED_LANGUAGE))
        .or_else(|| {
            tracks
                .iter()
                .find(|t| t.language_code.starts_with(PREFERRED_LANGUAGE))
        })
        .or_else(|| tracks.first())
}
