//! Storyline data model and the one-shot storyline synthesizer.
//!
//! A storyline is an ordered mapping from the nine canonical period
//! keys to period data. The synthesizer produces the whole structure in
//! a single JSON-completion round trip; the mapping shape is validated
//! here, at the boundary, while individual event fields beyond the
//! typed ones are carried opaquely.

use crate::llm::{GenError, TextGen};
use crate::prompts::PromptSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One of the nine canonical, ordered time windows.
///
/// Declaration order is canonical order, so the derived `Ord` keeps
/// any `BTreeMap` keyed by `PeriodKey` in chronological sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PeriodKey {
    #[serde(rename = "before_session_1")]
    BeforeSession1,
    #[serde(rename = "between_sessions_1_2")]
    BetweenSessions1And2,
    #[serde(rename = "between_sessions_2_3")]
    BetweenSessions2And3,
    #[serde(rename = "between_sessions_3_4")]
    BetweenSessions3And4,
    #[serde(rename = "between_sessions_4_5")]
    BetweenSessions4And5,
    #[serde(rename = "between_sessions_5_6")]
    BetweenSessions5And6,
    #[serde(rename = "between_sessions_6_7")]
    BetweenSessions6And7,
    #[serde(rename = "between_sessions_7_8")]
    BetweenSessions7And8,
    #[serde(rename = "between_sessions_8_9")]
    BetweenSessions8And9,
}

impl PeriodKey {
    /// All nine keys in canonical order.
    pub const ALL: [PeriodKey; 9] = [
        PeriodKey::BeforeSession1,
        PeriodKey::BetweenSessions1And2,
        PeriodKey::BetweenSessions2And3,
        PeriodKey::BetweenSessions3And4,
        PeriodKey::BetweenSessions4And5,
        PeriodKey::BetweenSessions5And6,
        PeriodKey::BetweenSessions6And7,
        PeriodKey::BetweenSessions7And8,
        PeriodKey::BetweenSessions8And9,
    ];

    /// The canonical string form of this key.
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKey::BeforeSession1 => "before_session_1",
            PeriodKey::BetweenSessions1And2 => "between_sessions_1_2",
            PeriodKey::BetweenSessions2And3 => "between_sessions_2_3",
            PeriodKey::BetweenSessions3And4 => "between_sessions_3_4",
            PeriodKey::BetweenSessions4And5 => "between_sessions_4_5",
            PeriodKey::BetweenSessions5And6 => "between_sessions_5_6",
            PeriodKey::BetweenSessions6And7 => "between_sessions_6_7",
            PeriodKey::BetweenSessions7And8 => "between_sessions_7_8",
            PeriodKey::BetweenSessions8And9 => "between_sessions_8_9",
        }
    }

    /// The period that leads into the given session.
    ///
    /// Session 1 is preceded by `before_session_1`; session `n` (for
    /// 2..=9) by `between_sessions_{n-1}_{n}`. Returns `None` for
    /// session indices outside the simulated arc.
    pub fn leading_into_session(session_index: u32) -> Option<PeriodKey> {
        match session_index {
            0 => None,
            n => PeriodKey::ALL.get(n as usize - 1).copied(),
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an event relates to the client's presenting difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Directly triggers the presenting difficulty.
    DirectTrigger,
    /// Triggers distress in another life domain.
    ParallelTrigger,
    /// A stressor interfering with change.
    Barrier,
    /// Ordinary life context.
    #[default]
    Background,
}

/// A structured life-occurrence record.
///
/// The typed fields are the ones the pipeline reads; whatever else the
/// service emits under the event schema is kept in `extra` and
/// round-trips untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub category: EventCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub domain: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The data recorded for one period.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodData {
    #[serde(default)]
    pub timeframe: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// The full ordered collection of period data for one simulated client.
///
/// Only the nine canonical keys are accepted; a subset is fine, an
/// unknown key fails deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Storyline {
    periods: BTreeMap<PeriodKey, PeriodData>,
}

impl Storyline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: PeriodKey, data: PeriodData) {
        self.periods.insert(key, data);
    }

    pub fn get(&self, key: PeriodKey) -> Option<&PeriodData> {
        self.periods.get(&key)
    }

    pub fn contains(&self, key: PeriodKey) -> bool {
        self.periods.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Iterate the periods in canonical order, skipping absent keys.
    ///
    /// This is the sequencing step of the pipeline: the fixed nine-key
    /// list restricted to the keys actually present, no substitution,
    /// no error.
    pub fn periods(&self) -> impl Iterator<Item = (PeriodKey, &PeriodData)> {
        PeriodKey::ALL
            .into_iter()
            .filter_map(|key| self.periods.get(&key).map(|data| (key, data)))
    }
}

/// Immutable client-identifying configuration.
///
/// Supplied once per client; consumed by both the storyline synthesizer
/// and the persona compiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProfile {
    /// Raw intake form text.
    pub intake_text: String,
    /// Cognitive distortion pattern labels.
    pub patterns: Vec<String>,
    /// The client's core automatic thought.
    pub core_thought: String,
}

impl ClientProfile {
    pub fn new(
        intake_text: impl Into<String>,
        patterns: Vec<String>,
        core_thought: impl Into<String>,
    ) -> Self {
        Self {
            intake_text: intake_text.into(),
            patterns,
            core_thought: core_thought.into(),
        }
    }

    fn validate(&self) -> Result<(), GenError> {
        if self.intake_text.trim().is_empty() {
            return Err(GenError::InvalidInput("intake text is empty".to_string()));
        }
        if self.patterns.is_empty() {
            return Err(GenError::InvalidInput("pattern list is empty".to_string()));
        }
        if self.core_thought.trim().is_empty() {
            return Err(GenError::InvalidInput("core thought is empty".to_string()));
        }
        Ok(())
    }
}

/// Generates the full storyline for a client in one round trip.
pub struct StorylineSynthesizer {
    backend: Arc<dyn TextGen>,
    system_prompt: String,
}

impl StorylineSynthesizer {
    /// Create a synthesizer with the bundled system specification.
    pub fn new(backend: Arc<dyn TextGen>) -> Self {
        Self {
            backend,
            system_prompt: PromptSet::default().storyline_system,
        }
    }

    /// Override the reusable system specification.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Produce the full ordered storyline from intake data.
    ///
    /// A single failed round trip, or a payload that does not parse as
    /// the mapping-of-periods shape, is fatal; no partial storyline is
    /// ever returned.
    pub async fn synthesize(&self, profile: &ClientProfile) -> Result<Storyline, GenError> {
        profile.validate()?;

        let user_prompt = build_user_prompt(profile)?;
        debug!(patterns = profile.patterns.len(), "synthesizing storyline");

        let value = self
            .backend
            .complete_json(&self.system_prompt, &user_prompt)
            .await?;

        serde_json::from_value(value)
            .map_err(|e| GenError::Schema(format!("response is not a storyline mapping: {e}")))
    }
}

fn build_user_prompt(profile: &ClientProfile) -> Result<String, GenError> {
    let patterns_json = serde_json::to_string(&profile.patterns)
        .map_err(|e| GenError::Schema(format!("failed to encode pattern list: {e}")))?;

    Ok(format!(
        "INTAKE FORM (RAW TEXT):\n{intake}\n\n\
         COGNITIVE DISTORTION PATTERNS (LIST):\n{patterns}\n\n\
         CORE AUTOMATIC THOUGHT (TEXT):\n\"{core_thought}\"\n\n\
         INSTRUCTIONS:\n\
         - Read the intake and infer:\n\
         \x20 - The main recurring situations where distress occurs.\n\
         \x20 - The central fears, beliefs, and emotions.\n\
         \x20 - The main life domains that matter to this client (e.g., work, family, study, friends, daily life).\n\
         - Use this inferred information to decide:\n\
         \x20 - Which events are DIRECT TRIGGERS of the presenting difficulty.\n\
         \x20 - Which events are PARALLEL TRIGGERS in other domains.\n\
         \x20 - Which events are BARRIERS (other stressors interfering with change).\n\
         \x20 - Which events are BACKGROUND (ordinary life events that give context).\n\
         - Follow the EVENT SCHEMA and JSON output format defined in the system prompt.\n\
         - Do NOT mention therapy, counseling, or sessions. Only describe life events.",
        intake = profile.intake_text,
        patterns = patterns_json,
        core_thought = profile.core_thought,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    fn sample_profile() -> ClientProfile {
        ClientProfile::new(
            "Presenting problem: anxiety about returning to the shelter.",
            vec!["catastrophizing".to_string(), "personalization".to_string()],
            "They will hate me if I go back.",
        )
    }

    #[test]
    fn test_canonical_order() {
        for window in PeriodKey::ALL.windows(2) {
            assert!(window[0] < window[1]);
        }
    }

    #[test]
    fn test_key_strings() {
        assert_eq!(PeriodKey::BeforeSession1.as_str(), "before_session_1");
        assert_eq!(
            PeriodKey::BetweenSessions8And9.as_str(),
            "between_sessions_8_9"
        );
        for key in PeriodKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn test_leading_into_session() {
        assert_eq!(
            PeriodKey::leading_into_session(1),
            Some(PeriodKey::BeforeSession1)
        );
        assert_eq!(
            PeriodKey::leading_into_session(2),
            Some(PeriodKey::BetweenSessions1And2)
        );
        assert_eq!(
            PeriodKey::leading_into_session(9),
            Some(PeriodKey::BetweenSessions8And9)
        );
        assert_eq!(PeriodKey::leading_into_session(0), None);
        assert_eq!(PeriodKey::leading_into_session(10), None);
    }

    #[test]
    fn test_storyline_orders_keys_canonically() {
        // Keys deliberately out of order in the source document.
        let json = r#"{
            "between_sessions_2_3": {"timeframe": "t3", "summary": "s3", "events": []},
            "before_session_1": {"timeframe": "t1", "summary": "s1", "events": []},
            "between_sessions_1_2": {"timeframe": "t2", "summary": "s2", "events": []}
        }"#;

        let storyline: Storyline = serde_json::from_str(json).unwrap();
        let keys: Vec<PeriodKey> = storyline.periods().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                PeriodKey::BeforeSession1,
                PeriodKey::BetweenSessions1And2,
                PeriodKey::BetweenSessions2And3,
            ]
        );
    }

    #[test]
    fn test_storyline_rejects_unknown_key() {
        let json = r#"{"after_session_9": {"timeframe": "", "summary": "", "events": []}}"#;
        assert!(serde_json::from_str::<Storyline>(json).is_err());
    }

    #[test]
    fn test_storyline_rejects_non_sequence_events() {
        let json = r#"{"before_session_1": {"timeframe": "", "summary": "", "events": "oops"}}"#;
        assert!(serde_json::from_str::<Storyline>(json).is_err());
    }

    #[test]
    fn test_event_extra_fields_round_trip() {
        let json = r#"{
            "category": "direct_trigger",
            "description": "skipped the volunteer shift",
            "domain": "work",
            "emotion": "guilt",
            "intensity": 4
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.category, EventCategory::DirectTrigger);
        assert_eq!(event.extra["emotion"], "guilt");

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["intensity"], 4);
    }

    #[test]
    fn test_event_category_defaults_to_background() {
        let event: Event = serde_json::from_str(r#"{"description": "made dinner"}"#).unwrap();
        assert_eq!(event.category, EventCategory::Background);
    }

    #[tokio::test]
    async fn test_synthesize_rejects_empty_intake() {
        let backend = Arc::new(MockBackend::new());
        let synthesizer = StorylineSynthesizer::new(backend.clone());

        let profile = ClientProfile::new("  ", vec!["catastrophizing".to_string()], "thought");
        let err = synthesizer.synthesize(&profile).await.unwrap_err();
        assert!(matches!(err, GenError::InvalidInput(_)));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_synthesize_parses_storyline() {
        let backend = Arc::new(MockBackend::with_responses([
            r#"{"before_session_1": {"timeframe": "week 0", "summary": "intro", "events": []}}"#,
        ]));
        let synthesizer = StorylineSynthesizer::new(backend.clone());

        let storyline = synthesizer.synthesize(&sample_profile()).await.unwrap();
        assert_eq!(storyline.len(), 1);
        assert!(storyline.contains(PeriodKey::BeforeSession1));

        let call = backend.last_call().unwrap();
        assert!(call.user.contains("INTAKE FORM"));
        assert!(call.user.contains("catastrophizing"));
        assert!(call.user.contains("\"They will hate me if I go back.\""));
    }

    #[tokio::test]
    async fn test_synthesize_malformed_response_is_schema_error() {
        let backend = Arc::new(MockBackend::with_responses(["not json at all"]));
        let synthesizer = StorylineSynthesizer::new(backend);

        let err = synthesizer.synthesize(&sample_profile()).await.unwrap_err();
        assert!(matches!(err, GenError::Schema(_)));
    }
}
