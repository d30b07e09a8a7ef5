//! Generate a storyline and its diary for a sample client.
//!
//! Requires OPENAI_API_KEY. Writes both artifacts to the current
//! directory, the way a real run would.

use std::sync::Arc;
use therasim_core::{
    save_diary, save_storyline, ClientProfile, NarrativeChainer, StorylineSynthesizer, TextGen,
};

const INTAKE: &str = "\
Name: Brooke Davis
Age: 41
Gender: female
Occupation: Veterinary Assistant
Marital Status: Single
Family Details: Lives alone with multiple pets

Presenting Problem:
I feel anxious and avoid going back to the animal shelter because I believe
the animals there will hate me for not remembering me. This leads to feelings
of guilt and self-blame. These feelings started a few months ago after a visit
to the shelter where some animals did not greet me as warmly as before. The
problem has escalated over time, causing me to avoid the shelter altogether.

Daily life: My anxiety about going to the shelter has disrupted my sleep
patterns and overall well-being.";

const CORE_THOUGHT: &str = "I frequent this animal shelter. All of the animals \
remembered me except a few, I can never go back there again they will hate me.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let profile = ClientProfile::new(
        INTAKE,
        vec![
            "catastrophizing".to_string(),
            "discounting the positive".to_string(),
            "labeling and mislabeling".to_string(),
            "mental filtering".to_string(),
            "jumping to conclusions: mind reading".to_string(),
            "jumping to conclusions: fortune-telling".to_string(),
            "personalization".to_string(),
            "black-and-white or polarized thinking / all or nothing thinking".to_string(),
        ],
        CORE_THOUGHT,
    );

    let backend: Arc<dyn TextGen> = Arc::new(openai::OpenAi::from_env()?);

    println!("Synthesizing storyline...");
    let storyline = StorylineSynthesizer::new(backend.clone())
        .synthesize(&profile)
        .await?;
    println!("  {} periods", storyline.len());

    let storyline_path = save_storyline(&storyline, ".").await?;
    println!("Storyline saved to: {}", storyline_path.display());

    println!("Narrativizing periods...");
    let diary = NarrativeChainer::new(backend)
        .narrativize_storyline(&storyline)
        .await?;

    let diary_path = save_diary(&diary, &storyline_path).await?;
    println!("Diary saved to: {}", diary_path.display());

    for (key, entry) in diary.entries() {
        let snippet: String = entry.diary_paragraph.chars().take(120).collect();
        println!("\n[{key}] {}", entry.timeframe);
        println!("  {snippet}...");
    }

    Ok(())
}
