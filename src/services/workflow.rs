use crate::core::story::{now_millis, Character, Scene, Story, StoryParams};
use crate::services::imagegen::{portrait_prompt, scene_prompt, AspectRatio, ImageGenClient};
use crate::services::llm::{strip_code_blocks, StoryContent, TextGenClient};
use futures_util::future::join_all;
use thiserror::Error;

/// Fatal failures of a generation run. Image failures never appear
/// here; they degrade the story instead of aborting it.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API key not set. Please go to Settings to add your key.")]
    MissingCredential,

    #[error("Invalid story structure received from the model: {0}")]
    MalformedStoryContent(String),

    #[error("Failed to create the story's plot. Please try a different theme.")]
    TextService(#[source] anyhow::Error),
}

/// Run lifecycle. `Error` is reachable only from `GeneratingText`;
/// once `Done` or `Error` is reached the run does not resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    GeneratingText,
    GeneratingImages,
    GeneratingCharacters,
    Done,
    Error,
}

impl RunState {
    pub fn message(self) -> &'static str {
        match self {
            RunState::Idle => "",
            RunState::GeneratingText => "Once upon a time...",
            RunState::GeneratingImages => "Painting the scenes...",
            RunState::GeneratingCharacters => "Meeting the characters...",
            RunState::Done => "Your story is ready!",
            RunState::Error => "Oh no!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Scene,
    Character,
}

/// Observer for a generation run. All callbacks are best-effort
/// UI plumbing; the orchestrator never depends on their behavior.
pub trait ProgressSink: Send + Sync {
    fn state_changed(&self, _state: RunState) {}

    /// Fires once, after the text step, with image slots still empty.
    /// The story is already narratable at this point.
    fn story_ready(&self, _story: &Story) {}

    fn image_ready(&self, _slot: ImageSlot, _index: usize, _url: &str) {}

    /// Non-fatal trouble worth telling the user about. At most one
    /// call per image phase.
    fn notify(&self, _message: &str) {}
}

/// Sink for callers that only want the final story.
pub struct NoopSink;

impl ProgressSink for NoopSink {}

const SCENE_FAILURE_NOTICE: &str =
    "Some scene pictures could not be painted. The story will still be told.";
const PORTRAIT_FAILURE_NOTICE: &str =
    "Some character portraits could not be drawn.";

/// Prompt template for the text step. Narrative and names in the
/// requested language, image prompts and descriptions in English,
/// a fixed six-part arc spread over 6 to 8 scenes.
fn story_prompt(params: &StoryParams) -> String {
    format!(
        "Generate a complete and engaging story for a {age}-year-old {gender}, \
with the theme of \"{theme}\".\n\
The story and its title MUST be written in the following language: {language}.\n\n\
The story must have a very clear and well-defined structure:\n\
1. Introduction: Introduce the main character(s) and the setting. Establish the initial situation. (1-2 scenes)\n\
2. Rising Action: Introduce a problem, a challenge, or a goal for the character. Build up suspense or excitement. (2-3 scenes)\n\
3. Climax: The turning point of the story where the character faces the main challenge. This should be the most exciting part. (1 scene)\n\
4. Falling Action: Show the immediate results of the climax. Things start to wind down. (1-2 scenes)\n\
5. Learning: The character learns something important or gains a new perspective. (1 scene)\n\
6. Resolution & Moral: The story concludes, the problem is solved, and there's a simple, positive moral or lesson learned. (1 scene)\n\n\
The total story should be broken down into 6 to 8 scenes.\n\
Each scene should have a narrative part (in {language}) and a separate, detailed image prompt (in English).\n\
Identify 1-3 main characters and provide their names (in {language}) and a description of them (in English).\n\
The tone must be magical, heartwarming, and full of wonder.\n\
Structure the output as a JSON object that strictly follows the provided schema.",
        age = params.age,
        gender = params.gender,
        theme = params.theme,
        language = params.language,
    )
}

/// Validates the raw text-step payload against the story schema.
/// Anything that does not parse into the full shape is malformed and
/// the run must restart from scratch; there is no retry.
pub fn parse_story_content(raw: &str) -> Result<StoryContent, GenerationError> {
    let clean = strip_code_blocks(raw);
    let content: StoryContent = serde_json::from_str(&clean)
        .map_err(|e| GenerationError::MalformedStoryContent(e.to_string()))?;

    if content.scenes.is_empty() {
        return Err(GenerationError::MalformedStoryContent(
            "scenes array is empty".to_string(),
        ));
    }
    if content.characters.is_empty() {
        return Err(GenerationError::MalformedStoryContent(
            "characters array is empty".to_string(),
        ));
    }

    Ok(content)
}

pub struct StoryGenerator {
    text: Box<dyn TextGenClient>,
    images: Box<dyn ImageGenClient>,
}

impl StoryGenerator {
    pub fn new(text: Box<dyn TextGenClient>, images: Box<dyn ImageGenClient>) -> Self {
        Self { text, images }
    }

    /// Runs one full generation: one text call, then one image call
    /// per scene and per character. The text step is the critical
    /// path; both image phases are best-effort and settle every
    /// request before the run completes.
    pub async fn generate(
        &self,
        params: &StoryParams,
        api_key: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Story, GenerationError> {
        if api_key.trim().is_empty() {
            sink.state_changed(RunState::Error);
            return Err(GenerationError::MissingCredential);
        }

        sink.state_changed(RunState::GeneratingText);
        let prompt = story_prompt(params);
        let raw = match self.text.generate(&prompt, api_key).await {
            Ok(raw) => raw,
            Err(e) => {
                sink.state_changed(RunState::Error);
                return Err(GenerationError::TextService(e));
            }
        };
        let content = match parse_story_content(&raw) {
            Ok(content) => content,
            Err(e) => {
                sink.state_changed(RunState::Error);
                return Err(e);
            }
        };

        let created_at = now_millis();
        let mut story = Story {
            id: format!("story_{}", created_at),
            title: content.title,
            params: params.clone(),
            scenes: content
                .scenes
                .into_iter()
                .enumerate()
                .map(|(i, s)| Scene {
                    id: format!("scene_{}", i),
                    text: s.text,
                    image_prompt: s.image_prompt,
                    image_url: None,
                })
                .collect(),
            characters: content
                .characters
                .into_iter()
                .map(|c| Character {
                    name: c.name,
                    description: c.description,
                    image_url: None,
                })
                .collect(),
            created_at,
        };

        // The story is usable for narration from here on, even if
        // every image call below fails.
        sink.story_ready(&story);

        sink.state_changed(RunState::GeneratingImages);
        let scene_results = self
            .illustrate(
                story
                    .scenes
                    .iter()
                    .map(|s| scene_prompt(&s.image_prompt))
                    .collect(),
                AspectRatio::Portrait,
                api_key,
            )
            .await;
        self.apply_outcomes(
            scene_results,
            ImageSlot::Scene,
            SCENE_FAILURE_NOTICE,
            &mut story,
            sink,
        );

        sink.state_changed(RunState::GeneratingCharacters);
        let portrait_results = self
            .illustrate(
                story
                    .characters
                    .iter()
                    .map(|c| portrait_prompt(&c.description))
                    .collect(),
                AspectRatio::Square,
                api_key,
            )
            .await;
        self.apply_outcomes(
            portrait_results,
            ImageSlot::Character,
            PORTRAIT_FAILURE_NOTICE,
            &mut story,
            sink,
        );

        sink.state_changed(RunState::Done);
        Ok(story)
    }

    /// One concurrent batch: every request is issued at once and every
    /// outcome is collected individually. One slow or failing image
    /// never cancels or voids its siblings.
    async fn illustrate(
        &self,
        prompts: Vec<String>,
        aspect: AspectRatio,
        api_key: &str,
    ) -> Vec<(usize, anyhow::Result<String>)> {
        let images = self.images.as_ref();
        join_all(prompts.into_iter().enumerate().map(|(i, prompt)| async move {
            (i, images.generate(&prompt, aspect, api_key).await)
        }))
        .await
    }

    /// Writes fulfilled images into their slots by index. Failures are
    /// logged; the first one per phase raises a single notification
    /// and later ones stay quiet.
    fn apply_outcomes(
        &self,
        outcomes: Vec<(usize, anyhow::Result<String>)>,
        slot: ImageSlot,
        notice: &str,
        story: &mut Story,
        sink: &dyn ProgressSink,
    ) {
        let mut notified = false;
        for (index, outcome) in outcomes {
            match outcome {
                Ok(url) => {
                    sink.image_ready(slot, index, &url);
                    match slot {
                        ImageSlot::Scene => story.scenes[index].image_url = Some(url),
                        ImageSlot::Character => story.characters[index].image_url = Some(url),
                    }
                }
                Err(e) => {
                    log::warn!("{:?} image {} failed: {:#}", slot, index, e);
                    if !notified {
                        sink.notify(notice);
                        notified = true;
                    }
                }
            }
        }
    }
}
