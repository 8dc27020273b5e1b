use anyhow::Result;
use inquire::{Select, Text};
use std::sync::Arc;

use storyforge::core::config::Config;
use storyforge::core::io::NativeStorage;
use storyforge::core::story::{Gender, StoryParams};
use storyforge::services::history::StoryStore;
use storyforge::services::imagegen::ImagenClient;
use storyforge::services::llm::GeminiClient;
use storyforge::services::workflow::{ImageSlot, ProgressSink, RunState, StoryGenerator};

struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn state_changed(&self, state: RunState) {
        let message = state.message();
        if !message.is_empty() {
            println!("{}", message);
        }
    }

    fn image_ready(&self, slot: ImageSlot, index: usize, _url: &str) {
        match slot {
            ImageSlot::Scene => println!("  Scene {} painted.", index + 1),
            ImageSlot::Character => println!("  Character {} drawn.", index + 1),
        }
    }

    fn notify(&self, message: &str) {
        eprintln!("! {}", message);
    }
}

fn ask_params(config: &Config) -> Result<StoryParams> {
    let age: u8 = Text::new("How old is the listener?")
        .with_default("6")
        .prompt()?
        .trim()
        .parse()?;

    let gender = match Select::new("Who is the story for?", vec!["boy", "girl", "child"]).prompt()? {
        "boy" => Gender::Boy,
        "girl" => Gender::Girl,
        _ => Gender::Neutral,
    };

    let theme = Text::new("What should the story be about?").prompt()?;

    let language = Text::new("Story language (BCP 47 tag):")
        .with_default(&config.language)
        .prompt()?;

    Ok(StoryParams {
        age,
        gender,
        theme,
        language,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load()?;
    let api_key = config.api_key.clone().unwrap_or_default();
    if api_key.is_empty() {
        eprintln!("No API key configured yet; add `api_key: ...` to config.yml.");
    }

    let store = StoryStore::new(Arc::new(NativeStorage::new()), &config.stories_folder);

    let action = Select::new(
        "What would you like to do?",
        vec!["create a story", "list saved stories"],
    )
    .prompt()?;

    if action == "list saved stories" {
        let stories = store.get_all().await?;
        if stories.is_empty() {
            println!("No saved stories yet.");
        }
        for story in stories {
            println!(
                "{}  \"{}\"  ({} scenes, {} characters)",
                story.id,
                story.title,
                story.scenes.len(),
                story.characters.len()
            );
        }
        return Ok(());
    }

    let params = ask_params(&config)?;

    let generator = StoryGenerator::new(
        Box::new(GeminiClient::new()),
        Box::new(ImagenClient::new()),
    );

    let story = generator.generate(&params, &api_key, &ConsoleSink).await?;

    store.put(&story).await?;
    println!(
        "Saved \"{}\" as {}/{}.json",
        story.title, config.stories_folder, story.id
    );

    Ok(())
}
