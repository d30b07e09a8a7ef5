//! Two client turns against a freshly synthesized storyline.
//!
//! Requires OPENAI_API_KEY.

use std::sync::Arc;
use therasim_core::{ClientProfile, Session, StorylineSynthesizer, TextGen};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let profile = ClientProfile::new(
        "Name: Brooke Davis. Age: 41. Occupation: Veterinary Assistant.\n\
         Presenting Problem: anxiety and avoidance around the animal shelter, \
         with guilt and self-blame after some animals did not greet her warmly.",
        vec![
            "catastrophizing".to_string(),
            "personalization".to_string(),
            "jumping to conclusions: mind reading".to_string(),
        ],
        "I can never go back there again, they will hate me.",
    );

    let backend: Arc<dyn TextGen> = Arc::new(openai::OpenAi::from_env()?);

    println!("Synthesizing storyline...");
    let storyline = StorylineSynthesizer::new(backend.clone())
        .synthesize(&profile)
        .await?;

    println!("Generating persona and starting session 1...");
    let mut session = Session::begin(backend, &profile, storyline, 1, "Brooke").await?;

    let therapist_line_1 =
        "Thank you for coming today, Brooke. What has been weighing on you the most lately?";
    let reply_1 = session.therapist_says(therapist_line_1).await?;

    let therapist_line_2 = "I appreciate you sharing that. Can you tell me about a recent \
                            moment when those feelings were especially strong?";
    let reply_2 = session.therapist_says(therapist_line_2).await?;

    println!("\n=== TWO-TURN DEMO ===");
    println!("THERAPIST (Turn 1): {therapist_line_1}");
    println!("CLIENT    (Turn 1): {reply_1}\n");
    println!("THERAPIST (Turn 2): {therapist_line_2}");
    println!("CLIENT    (Turn 2): {reply_2}");

    Ok(())
}
