use crate::core::story::Story;
use crate::services::voice::{pick_voice, VoiceDescriptor, VoicePreference};
use anyhow::Result;
use async_trait::async_trait;

/// Speech synthesis seam. `speak` resolves once, when playback of the
/// utterance finishes. The catalog may change between queries.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn voices(&self) -> Result<Vec<VoiceDescriptor>>;
    async fn speak(
        &self,
        text: &str,
        language: &str,
        voice: Option<&VoiceDescriptor>,
    ) -> Result<()>;
    fn cancel(&self);
}

/// Plays a story's scenes in order through a speech engine, picking
/// a voice per scene from the current catalog.
pub struct Narrator {
    engine: Box<dyn SpeechEngine>,
    preference: VoicePreference,
}

impl Narrator {
    pub fn new(engine: Box<dyn SpeechEngine>, preference: VoicePreference) -> Self {
        Self { engine, preference }
    }

    /// Reads every scene in sequence. A synthesis error stops playback
    /// quietly; narration is best-effort and never crashes the caller.
    pub async fn narrate(&self, story: &Story) {
        let language = &story.params.language;
        for scene in &story.scenes {
            // Re-query each scene; the catalog can change while we play.
            let catalog = match self.engine.voices().await {
                Ok(catalog) => catalog,
                Err(e) => {
                    log::warn!("Voice catalog unavailable: {:#}", e);
                    Vec::new()
                }
            };
            let voice = pick_voice(&catalog, language, self.preference);

            if let Err(e) = self.engine.speak(&scene.text, language, voice.as_ref()).await {
                log::error!("Speech synthesis failed on {}: {:#}", scene.id, e);
                return;
            }
        }
    }

    pub fn stop(&self) {
        self.engine.cancel();
    }
}
