//! Simulated-client narrative synthesis and dialogue engine.
//!
//! This crate provides:
//! - One-shot storyline synthesis from intake data
//! - Chained diary narration with one-paragraph context windows
//! - Persona compilation into a reusable behavioral spec
//! - A persona-bound dialogue agent for turn-by-turn client replies
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use therasim_core::{ClientProfile, NarrativeChainer, StorylineSynthesizer, TextGen};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend: Arc<dyn TextGen> = Arc::new(openai::OpenAi::from_env()?);
//!
//!     let profile = ClientProfile::new(intake_text, patterns, core_thought);
//!     let storyline = StorylineSynthesizer::new(backend.clone())
//!         .synthesize(&profile)
//!         .await?;
//!
//!     let diary = NarrativeChainer::new(backend)
//!         .narrativize_storyline(&storyline)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod llm;
pub mod narrator;
pub mod persist;
pub mod persona;
pub mod prompts;
pub mod session;
pub mod storyline;
pub mod testing;

// Primary public API
pub use agent::{ClientAgent, Speaker, Utterance};
pub use llm::{GenError, TextGen};
pub use narrator::{Diary, DiaryEntry, NarrativeChainer};
pub use persist::{load_storyline, save_diary, save_storyline, PersistError};
pub use persona::{PersonaCompiler, PersonaSpec};
pub use prompts::PromptSet;
pub use session::Session;
pub use storyline::{
    ClientProfile, Event, EventCategory, PeriodData, PeriodKey, Storyline, StorylineSynthesizer,
};
