//! Session - a convenience wrapper for driving a simulated session.
//!
//! Binds persona compilation, the dialogue agent, and the accumulating
//! conversation history into one object. The persona is compiled
//! exactly once at `begin`; every turn of the session references that
//! same instance.

use crate::agent::{ClientAgent, Utterance};
use crate::llm::{GenError, TextGen};
use crate::persona::{PersonaCompiler, PersonaSpec};
use crate::storyline::{ClientProfile, Storyline};
use std::sync::Arc;
use tracing::info;

/// A running simulated session with one client.
///
/// There is no terminal state: a session ends when the caller stops
/// issuing turns.
pub struct Session {
    agent: ClientAgent,
    storyline: Storyline,
    session_index: u32,
    history: Vec<Utterance>,
}

impl Session {
    /// Compile the persona and bind the agent for one session.
    pub async fn begin(
        backend: Arc<dyn TextGen>,
        profile: &ClientProfile,
        storyline: Storyline,
        session_index: u32,
        client_label: impl Into<String>,
    ) -> Result<Self, GenError> {
        let persona = PersonaCompiler::new(backend.clone()).compile(profile).await?;
        info!(session = session_index, "session started");

        Ok(Self::from_parts(
            ClientAgent::new(backend, persona, client_label),
            storyline,
            session_index,
        ))
    }

    /// Assemble a session from an already-bound agent.
    pub fn from_parts(agent: ClientAgent, storyline: Storyline, session_index: u32) -> Self {
        Self {
            agent,
            storyline,
            session_index,
            history: Vec::new(),
        }
    }

    /// Feed the therapist's line and get the client's reply.
    ///
    /// Both utterances are appended to the session's history.
    pub async fn therapist_says(&mut self, line: &str) -> Result<String, GenError> {
        let reply = self
            .agent
            .generate_reply(self.session_index, &self.storyline, line, &self.history)
            .await?;

        self.history.push(Utterance::therapist(line));
        self.history.push(Utterance::client(reply.clone()));
        Ok(reply)
    }

    pub fn history(&self) -> &[Utterance] {
        &self.history
    }

    pub fn persona(&self) -> &PersonaSpec {
        self.agent.persona()
    }

    pub fn session_index(&self) -> u32 {
        self.session_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Speaker;
    use crate::testing::MockBackend;

    fn sample_profile() -> ClientProfile {
        ClientProfile::new(
            "Intake text.",
            vec!["catastrophizing".to_string()],
            "They will hate me.",
        )
    }

    #[tokio::test]
    async fn test_persona_compiled_once() {
        let backend = Arc::new(MockBackend::with_responses([
            "the persona",
            "reply one",
            "reply two",
        ]));

        let mut session = Session::begin(
            backend.clone(),
            &sample_profile(),
            Storyline::new(),
            1,
            "Brooke",
        )
        .await
        .unwrap();

        session.therapist_says("Hello.").await.unwrap();
        session.therapist_says("Go on.").await.unwrap();

        // One compile call plus one call per turn.
        assert_eq!(backend.call_count(), 3);
        assert_eq!(session.persona().as_str(), "the persona");
    }

    #[tokio::test]
    async fn test_history_accumulates_in_order() {
        let backend = Arc::new(MockBackend::with_responses([
            "the persona",
            "first reply",
            "second reply",
        ]));

        let mut session = Session::begin(
            backend,
            &sample_profile(),
            Storyline::new(),
            1,
            "Brooke",
        )
        .await
        .unwrap();

        session.therapist_says("Opening line.").await.unwrap();
        let reply = session.therapist_says("Follow-up.").await.unwrap();
        assert_eq!(reply, "second reply");

        let history = session.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].speaker, Speaker::Therapist);
        assert_eq!(history[0].text, "Opening line.");
        assert_eq!(history[1].text, "first reply");
        assert_eq!(history[3].text, "second reply");
    }
}
