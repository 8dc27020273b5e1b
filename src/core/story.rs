use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Boy,
    Girl,
    Neutral,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Boy => write!(f, "boy"),
            Gender::Girl => write!(f, "girl"),
            Gender::Neutral => write!(f, "child"),
        }
    }
}

/// Immutable input to a generation run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoryParams {
    pub age: u8,
    pub gender: Gender,
    pub theme: String,
    /// BCP 47 language tag, e.g. "en-US" or "de".
    pub language: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    /// Narrative text in the requested language.
    pub text: String,
    /// English prompt for the image generator.
    pub image_prompt: String,
    /// Data URI, filled in as illustration calls resolve. Stays absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Name in the requested language, unique within a story.
    pub name: String,
    /// English description used for the portrait prompt.
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub title: String,
    pub params: StoryParams,
    pub scenes: Vec<Scene>,
    pub characters: Vec<Character>,
    /// Unix milliseconds.
    pub created_at: u64,
}

impl Story {
    /// A story can be narrated as soon as every scene carries text.
    /// Image slots are eventually consistent and not required.
    pub fn is_narratable(&self) -> bool {
        !self.scenes.is_empty() && self.scenes.iter().all(|s| !s.text.is_empty())
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
