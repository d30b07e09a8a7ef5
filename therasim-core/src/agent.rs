//! The stateful dialogue agent playing the simulated client.
//!
//! The agent is bound to a persona at construction and holds no other
//! internal state: the storyline and the conversation history are
//! supplied by the caller on every turn, so repeated calls with the
//! same arguments are reproducible modulo the service itself.

use crate::llm::{GenError, TextGen};
use crate::persona::PersonaSpec;
use crate::storyline::{PeriodKey, Storyline};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Who said a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Therapist,
    Client,
}

/// One line of conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: Speaker,
    pub text: String,
}

impl Utterance {
    pub fn therapist(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Therapist,
            text: text.into(),
        }
    }

    pub fn client(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Client,
            text: text.into(),
        }
    }
}

/// Turn-based generator producing one client utterance per invocation.
pub struct ClientAgent {
    backend: Arc<dyn TextGen>,
    persona: PersonaSpec,
    label: String,
}

impl ClientAgent {
    /// Bind an agent to a compiled persona.
    pub fn new(backend: Arc<dyn TextGen>, persona: PersonaSpec, label: impl Into<String>) -> Self {
        Self {
            backend,
            persona,
            label: label.into(),
        }
    }

    pub fn persona(&self) -> &PersonaSpec {
        &self.persona
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Generate the client's next line.
    ///
    /// Combines the fixed persona, the storyline period leading into
    /// `session_index`, the full conversation history so far, and the
    /// therapist's latest line. The history window is unbounded, unlike
    /// the diary chain's one-paragraph context.
    pub async fn generate_reply(
        &self,
        session_index: u32,
        storyline: &Storyline,
        therapist_utterance: &str,
        conversation_history: &[Utterance],
    ) -> Result<String, GenError> {
        let system_prompt = self.build_system_prompt();
        let user_prompt = self.build_user_prompt(
            session_index,
            storyline,
            therapist_utterance,
            conversation_history,
        )?;

        debug!(session = session_index, turns = conversation_history.len(), "generating client reply");

        let raw = self
            .backend
            .complete_text(&system_prompt, &user_prompt)
            .await?;

        Ok(raw.trim().to_string())
    }

    fn build_system_prompt(&self) -> String {
        format!(
            "{persona}\n\n\
             You are roleplaying {label}, the client, in a counseling conversation.\n\
             - Always answer in the first person, as {label}.\n\
             - Stay in character; never mention that you are an AI or a simulation.\n\
             - Reply with exactly one conversational turn: a few natural sentences, \
             no headings, no stage directions.",
            persona = self.persona.as_str(),
            label = self.label,
        )
    }

    fn build_user_prompt(
        &self,
        session_index: u32,
        storyline: &Storyline,
        therapist_utterance: &str,
        conversation_history: &[Utterance],
    ) -> Result<String, GenError> {
        let mut prompt = String::new();

        // Period data leading into this session, when the storyline
        // has it. Absent periods are simply omitted, never invented.
        if let Some(period) = PeriodKey::leading_into_session(session_index)
            .and_then(|key| storyline.get(key))
        {
            let events_json = serde_json::to_string_pretty(&period.events)
                .map_err(|e| GenError::Schema(format!("failed to encode events: {e}")))?;

            prompt.push_str(&format!(
                "WHAT HAPPENED IN YOUR LIFE RECENTLY ({timeframe}):\n\
                 {summary}\n\
                 EVENTS (JSON LIST):\n{events}\n\n\
                 These are things you lived through; bring them up naturally when relevant, \
                 as memories, not as a list.\n\n",
                timeframe = period.timeframe,
                summary = period.summary,
                events = events_json,
            ));
        }

        if !conversation_history.is_empty() {
            prompt.push_str("CONVERSATION SO FAR:\n");
            for utterance in conversation_history {
                let speaker = match utterance.speaker {
                    Speaker::Therapist => "THERAPIST",
                    Speaker::Client => self.label.as_str(),
                };
                prompt.push_str(&format!("{speaker}: {}\n", utterance.text));
            }
            prompt.push('\n');
        }

        prompt.push_str(&format!(
            "THERAPIST: {therapist_utterance}\n\n\
             Respond as {label} with your next line only.",
            label = self.label,
        ));

        Ok(prompt)
    }
}
