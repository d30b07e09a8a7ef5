//! Persona compilation: intake data to a reusable behavioral spec.
//!
//! One round trip per client. The result is free text with five
//! required sections; the compiler trusts the service to honor that
//! structure and only trims whitespace. Adding structural validation
//! would change observable behavior, so it is deliberately absent.

use crate::llm::{GenError, TextGen};
use crate::storyline::ClientProfile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const COMPILER_SYSTEM_PROMPT: &str = "You are an expert clinical psychologist and simulation architect.\n\
     Your job is to transform raw client data into a concise, actionable \
     system prompt that forces an AI agent to roleplay this client realistically.";

/// A compiled behavioral specification for one simulated client.
///
/// Opaque text with five sections: identity/voice, core struggle,
/// per-pattern behavioral translations, interaction style, and roleplay
/// instructions. Compiled once per client and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonaSpec(String);

impl PersonaSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonaSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compiles a [`ClientProfile`] into a [`PersonaSpec`].
pub struct PersonaCompiler {
    backend: Arc<dyn TextGen>,
}

impl PersonaCompiler {
    pub fn new(backend: Arc<dyn TextGen>) -> Self {
        Self { backend }
    }

    /// One round trip; the trimmed response is the persona.
    pub async fn compile(&self, profile: &ClientProfile) -> Result<PersonaSpec, GenError> {
        let user_prompt = build_user_prompt(profile);
        debug!("compiling persona");

        let raw = self
            .backend
            .complete_text(COMPILER_SYSTEM_PROMPT, &user_prompt)
            .await?;

        Ok(PersonaSpec::new(raw.trim()))
    }
}

fn build_user_prompt(profile: &ClientProfile) -> String {
    format!(
        "### INPUT DATA\n\
         [RAW INTAKE TEXT]\n{intake}\n\n\
         [COGNITIVE DISTORTION PATTERNS]\n{patterns}\n\n\
         [CORE AUTOMATIC THOUGHT]\n\"{core_thought}\"\n\n\
         ---\n\n\
         ### TASK\n\
         Create a SYSTEM PROMPT SECTION that will be used to instruct an AI to roleplay this specific client.\n\n\
         Follow this structure and write it as if you are directly speaking to the AI agent who will play the client:\n\n\
         1. IDENTITY & VOICE\n\
         \x20  - Briefly summarize who the client is (age, role, life context).\n\
         \x20  - Describe how they tend to speak (e.g., tentative, apologetic, overexplaining, joking, guarded).\n\n\
         2. CORE STRUGGLE\n\
         \x20  - Concisely state what is most painful or distressing for them right now, based on the intake.\n\
         \x20  - Focus on why this is a problem now (impact on work, relationships, sleep, daily life).\n\n\
         3. BEHAVIORAL TRANSLATION OF COGNITIVE PATTERNS\n\
         \x20  - For EACH cognitive pattern listed in [COGNITIVE DISTORTION PATTERNS], write a concrete instruction\n\
         \x20    on how to act it out in the context of THIS client's problem.\n\
         \x20  - Do NOT just restate the distortion name.\n\
         \x20  - Make these instructions specific to this client's context and core thought.\n\n\
         4. INTERACTION STYLE WITH THE HELPER\n\
         \x20  - Describe how this client tends to relate to someone who is trying to help them:\n\
         \x20    e.g., eager to please, minimizes their own pain, defensive when challenged, ashamed, afraid of disappointing.\n\
         \x20  - Include how quickly they open up, how they handle disagreement, and whether they ask for reassurance.\n\n\
         5. ROLEPLAY INSTRUCTIONS\n\
         \x20  - End with 3-6 bullet-style instructions that directly tell the AI how to behave during the conversation.\n\n\
         ### OUTPUT FORMAT\n\
         - Return ONLY the final system prompt text.\n\
         - Do NOT include headings like 'INPUT DATA' or 'TASK' in the output.\n\
         - Do NOT break character and do NOT add meta-commentary.",
        intake = profile.intake_text,
        patterns = profile.patterns.join(", "),
        core_thought = profile.core_thought,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    fn sample_profile() -> ClientProfile {
        ClientProfile::new(
            "Name: Brooke Davis. Presenting problem: anxiety about the shelter.",
            vec![
                "catastrophizing".to_string(),
                "mind reading".to_string(),
            ],
            "They will hate me.",
        )
    }

    #[tokio::test]
    async fn test_compile_trims_response() {
        let backend = Arc::new(MockBackend::with_responses([
            "\n\n  You are Brooke, 41, a veterinary assistant...  \n",
        ]));
        let compiler = PersonaCompiler::new(backend);

        let persona = compiler.compile(&sample_profile()).await.unwrap();
        assert_eq!(
            persona.as_str(),
            "You are Brooke, 41, a veterinary assistant..."
        );
    }

    #[tokio::test]
    async fn test_compile_embeds_profile() {
        let backend = Arc::new(MockBackend::with_responses(["persona text"]));
        let compiler = PersonaCompiler::new(backend.clone());

        compiler.compile(&sample_profile()).await.unwrap();

        let call = backend.last_call().unwrap();
        assert!(call.system.contains("simulation architect"));
        assert!(call.user.contains("Brooke Davis"));
        assert!(call.user.contains("catastrophizing, mind reading"));
        assert!(call.user.contains("\"They will hate me.\""));
    }
}
