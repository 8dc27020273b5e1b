use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

const IMAGE_MODEL: &str = "imagen-3.0-generate-002";

const SCENE_STYLE_SUFFIX: &str = ", in the style of a vibrant and whimsical \
children's book illustration, colorful, friendly characters, soft lighting, \
detailed and magical.";

const PORTRAIT_STYLE_SUFFIX: &str = ", in the style of a vibrant and whimsical \
children's book character design, friendly face, centered, white background, \
detailed and magical.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    /// 9:16, used for scene cards.
    Portrait,
    /// 1:1, used for character portraits.
    Square,
}

impl AspectRatio {
    fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        }
    }
}

/// Image-generation service. One prompt in, one self-contained data
/// URI out, or an error.
#[async_trait]
pub trait ImageGenClient: Send + Sync + Debug {
    async fn generate(&self, prompt: &str, aspect: AspectRatio, api_key: &str) -> Result<String>;
}

/// Wraps a scene's image prompt in the fixed illustration style.
pub fn scene_prompt(image_prompt: &str) -> String {
    format!("{}{}", image_prompt, SCENE_STYLE_SUFFIX)
}

/// Wraps a character description in the fixed portrait style.
pub fn portrait_prompt(description: &str) -> String {
    format!("Portrait of {}{}", description, PORTRAIT_STYLE_SUFFIX)
}

// --- Imagen ---

#[derive(Debug)]
pub struct ImagenClient {
    model: String,
    client: reqwest::Client,
}

impl ImagenClient {
    pub fn new() -> Self {
        Self {
            model: IMAGE_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ImagenClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ImagenRequest {
    instances: Vec<ImagenInstance>,
    parameters: ImagenParameters,
}

#[derive(Serialize)]
struct ImagenInstance {
    prompt: String,
}

#[derive(Serialize)]
struct ImagenParameters {
    #[serde(rename = "sampleCount")]
    sample_count: u32,
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
    #[serde(rename = "outputMimeType")]
    output_mime_type: String,
}

#[derive(Deserialize)]
struct ImagenResponse {
    #[serde(default)]
    predictions: Vec<ImagenPrediction>,
    error: Option<ImagenError>,
}

#[derive(Deserialize)]
struct ImagenPrediction {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64_encoded: String,
}

#[derive(Deserialize, Debug)]
struct ImagenError {
    message: String,
}

fn to_data_uri(base64_jpeg: &str) -> String {
    format!("data:image/jpeg;base64,{}", base64_jpeg)
}

#[async_trait]
impl ImageGenClient for ImagenClient {
    async fn generate(&self, prompt: &str, aspect: AspectRatio, api_key: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:predict?key={}",
            self.model, api_key
        );

        let request_body = ImagenRequest {
            instances: vec![ImagenInstance {
                prompt: prompt.to_string(),
            }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: aspect.as_str().to_string(),
                output_mime_type: "image/jpeg".to_string(),
            },
        };

        let resp = self.client.post(&url).json(&request_body).send().await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("Imagen API error: {}", error_text));
        }

        let result: ImagenResponse = resp.json().await?;

        if let Some(err) = result.error {
            return Err(anyhow!("Imagen API returned error: {}", err.message));
        }

        match result.predictions.first() {
            Some(p) => Ok(to_data_uri(&p.bytes_base64_encoded)),
            None => Err(anyhow!("No image was generated")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_wrappers_apply_fixed_style() {
        let scene = scene_prompt("a fox jumping over a stream");
        assert!(scene.starts_with("a fox jumping over a stream"));
        assert!(scene.contains("children's book illustration"));

        let portrait = portrait_prompt("a curious red fox");
        assert!(portrait.starts_with("Portrait of a curious red fox"));
        assert!(portrait.contains("white background"));
    }

    #[test]
    fn aspect_ratios_map_to_wire_strings() {
        assert_eq!(AspectRatio::Portrait.as_str(), "9:16");
        assert_eq!(AspectRatio::Square.as_str(), "1:1");
    }

    #[test]
    fn imagen_response_parsing_success() {
        let json = r#"{
            "predictions": [
                { "bytesBase64Encoded": "QUJDRA==" }
            ]
        }"#;

        let result: ImagenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            to_data_uri(&result.predictions[0].bytes_base64_encoded),
            "data:image/jpeg;base64,QUJDRA=="
        );
    }

    #[test]
    fn imagen_response_parsing_empty() {
        let result: ImagenResponse = serde_json::from_str("{}").unwrap();
        assert!(result.predictions.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn imagen_error_body_parses() {
        let json = r#"{ "error": { "message": "quota exceeded" } }"#;
        let result: ImagenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(result.error.unwrap().message, "quota exceeded");
    }
}
