// Config - valentine.toml settings and the API key

use crate::generation::GeminiConfig;
use crate::journey::{Catalog, CatalogError, Catalogs, DEFAULT_COLORS, DEFAULT_FLOWERS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory
pub const CONFIG_FILE: &str = "valentine.toml";

/// Environment variables checked for the API credential, in order
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValentineConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub journey: JourneyConfig,
    #[serde(default)]
    pub share: ShareConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_flowers")]
    pub flowers: Vec<String>,

    #[serde(default = "default_colors")]
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JourneyConfig {
    /// Partner picture used for the comic when none is uploaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_partner_photo: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Where the download fallback writes the comic (default: the user's download folder)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,

    /// Program that receives the exported file as its last argument, e.g. `["xdg-open"]`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    #[serde(default = "default_share_title")]
    pub title: String,

    #[serde(default = "default_share_text")]
    pub text: String,
}

// Defaults

fn default_flowers() -> Vec<String> {
    DEFAULT_FLOWERS.iter().map(|s| s.to_string()).collect()
}

fn default_colors() -> Vec<String> {
    DEFAULT_COLORS.iter().map(|s| s.to_string()).collect()
}

fn default_share_title() -> String {
    "Our Dreamy Valentine's Proposal".to_string()
}

fn default_share_text() -> String {
    "Look at this beautiful comic that was generated for us! Happy Valentine's Day! ❤️".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            flowers: default_flowers(),
            colors: default_colors(),
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            command: Vec::new(),
            title: default_share_title(),
            text: default_share_text(),
        }
    }
}

impl CatalogConfig {
    pub fn catalogs(&self) -> Result<Catalogs, CatalogError> {
        Ok(Catalogs {
            flowers: Catalog::new("flowers", self.flowers.clone())?,
            colors: Catalog::new("colors", self.colors.clone())?,
        })
    }
}

impl ShareConfig {
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl ValentineConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ValentineConfig = toml::from_str(&contents)?;
        config.catalog.catalogs()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load from an explicit path, the first file found by [`find_config`], or defaults
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match find_config() {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                Self::from_file(path)
            }
            None => {
                tracing::info!("No {} found, using default config", CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }
}

/// Look in the working directory first, then the user config directory
pub fn find_config() -> Option<PathBuf> {
    let local_config = PathBuf::from(CONFIG_FILE);
    if local_config.exists() {
        return Some(local_config);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user_config = config_dir.join("valentine").join("config.toml");
        if user_config.exists() {
            return Some(user_config);
        }
    }

    None
}

/// The generative service credential. Never printed or serialized.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Read the key from the environment after loading a `.env` file if present
    pub fn from_env() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env file from: {}", path.display());
        }

        API_KEY_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
            .map(Self::new)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key found; set {} (or add it to a .env file)",
                    API_KEY_VARS[0]
                )
            })
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
