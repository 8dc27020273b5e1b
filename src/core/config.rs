use crate::services::voice::VoicePreference;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILE: &str = "config.yml";

/// Process-wide settings, loaded once at startup and written through
/// on every change. Passed explicitly, never global.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Credential for the generation services. Absent until the user
    /// sets one; generation refuses to start without it.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub voice_preference: VoicePreference,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_stories_folder")]
    pub stories_folder: String,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_stories_folder() -> String {
    "stories".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            voice_preference: VoicePreference::default(),
            language: default_language(),
            stories_folder: default_stories_folder(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Missing file is not an error; first run starts from defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Path::new(CONFIG_FILE))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn set_api_key(&mut self, key: Option<String>) -> Result<()> {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self.save()
    }

    pub fn set_voice_preference(&mut self, preference: VoicePreference) -> Result<()> {
        self.voice_preference = preference;
        self.save()
    }
}
