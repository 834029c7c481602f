use std::path::PathBuf;

use crate::config::CredentialsConfig;

/// Best-effort lookup of the optional session cookie.
///
/// Sources are consulted in order: an explicit override (CLI flag or environment), the
/// `credentials.cookie` property, then the contents of `credentials.cookie_file`. Blank values
/// count as absent, and an unreadable file only logs a warning.
#[derive(Debug, Clone, Default)]
pub struct CredentialSource {
    explicit: Option<String>,
    cookie: Option<String>,
    cookie_file: Option<PathBuf>,
}

impl CredentialSource {
    pub fn new(explicit: Option<String>, config: &CredentialsConfig) -> Self {
        Self {
            explicit,
            cookie: config.cookie.clone(),
            cookie_file: config.cookie_file.clone(),
        }
    }

    /// Read the cookie header value, if any source provides one
    pub fn cookie(&self) -> Option<String> {
        if let Some(value) = non_blank(self.explicit.as_deref()) {
            return Some(value);
        }

        if let Some(value) = non_blank(self.cookie.as_deref()) {
            return Some(value);
        }

        let path = self.cookie_file.as_ref()?;
        match fs_err::read_to_string(path) {
            Ok(content) => non_blank(Some(&content)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cookie file: {}", e);
                None
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
