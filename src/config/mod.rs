use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Outbound HTTP settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Session cookie sources
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// CLI output defaults
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Optional HTTP/SOCKS proxy URL
    pub proxy: Option<String>,

    /// Accept-Language sent with browser-style requests
    pub accept_language: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Raw cookie header value copied from a logged-in browser session
    pub cookie: Option<String>,

    /// File holding the cookie header value
    pub cookie_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "raw")
    pub default_format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            proxy: None,
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "json".to_string(),
            pretty: true,
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            if let Err(e) = config.save_to(&config_path) {
                // A read-only home directory must not stop a fetch
                tracing::warn!(
                    "Could not write default config to {}: {}",
                    config_path.display(),
                    e
                );
            }
            Ok(config)
        }
    }

    /// Load and validate configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("caption-resolver").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be greater than zero");
        }

        if let Some(proxy) = &self.http.proxy {
            url::Url::parse(proxy).with_context(|| format!("Invalid proxy URL: {}", proxy))?;
        }

        if !matches!(self.output.default_format.as_str(), "json" | "raw") {
            anyhow::bail!(
                "output.default_format must be \"json\" or \"raw\", got \"{}\"",
                self.output.default_format
            );
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Timeout: {}s", self.http.timeout_secs);
        if let Some(proxy) = &self.http.proxy {
            println!("  Proxy: {}", proxy);
        }
        println!("  Accept-Language: {}", self.http.accept_language);
        let cookie = match &self.credentials.cookie {
            Some(c) if !c.trim().is_empty() => format!("set ({} chars)", c.len()),
            _ => "not set".to_string(),
        };
        println!("  Cookie: {}", cookie);
        if let Some(path) = &self.credentials.cookie_file {
            println!("  Cookie file: {}", path.display());
        }
        println!("  Default Format: {}", self.output.default_format);
    }
}
