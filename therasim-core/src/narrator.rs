//! Diary narration: one paragraph per period, chained in order.
//!
//! Each period's events become one diary paragraph. The only context a
//! call carries is the immediately preceding paragraph; the chain over
//! a storyline is therefore strictly sequential, because period *k*'s
//! output is an input to period *k+1*.

use crate::llm::{GenError, TextGen};
use crate::prompts::PromptSet;
use crate::storyline::{Event, PeriodKey, Storyline};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// One narrated period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiaryEntry {
    #[serde(default)]
    pub timeframe: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub diary_paragraph: String,
}

/// The ordered collection of narrated paragraphs for one client.
///
/// Same key-ordering invariant as [`Storyline`]; contains only keys
/// that were present in the source storyline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diary {
    entries: BTreeMap<PeriodKey, DiaryEntry>,
}

impl Diary {
    pub fn insert(&mut self, key: PeriodKey, entry: DiaryEntry) {
        self.entries.insert(key, entry);
    }

    pub fn get(&self, key: PeriodKey) -> Option<&DiaryEntry> {
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the entries in canonical period order.
    pub fn entries(&self) -> impl Iterator<Item = (PeriodKey, &DiaryEntry)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

/// Converts period events into diary paragraphs.
pub struct NarrativeChainer {
    backend: Arc<dyn TextGen>,
    system_prompt: String,
}

impl NarrativeChainer {
    /// Create a chainer with the bundled style specification.
    pub fn new(backend: Arc<dyn TextGen>) -> Self {
        Self {
            backend,
            system_prompt: PromptSet::default().narrator_system,
        }
    }

    /// Override the reusable style specification.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Narrate one period's events into a single paragraph.
    ///
    /// An empty event list short-circuits to the empty string without
    /// contacting the service; that is a defined outcome, not an error.
    /// `previous_paragraph` is the verbatim output of the preceding
    /// period's call, or empty when there is none.
    pub async fn narrativize(
        &self,
        events: &[Event],
        previous_paragraph: &str,
    ) -> Result<String, GenError> {
        if events.is_empty() {
            return Ok(String::new());
        }

        let events_json = serde_json::to_string_pretty(events)
            .map_err(|e| GenError::Schema(format!("failed to encode events: {e}")))?;

        let prev = previous_paragraph.trim();
        let mut user_prompt = String::new();

        if prev.is_empty() {
            user_prompt.push_str(
                "NO previous diary paragraph is available for this client. \
                 Write a stand-alone diary paragraph for this period.\n",
            );
        } else {
            user_prompt.push_str("PREVIOUS DIARY PARAGRAPH (IMMEDIATELY BEFORE THIS PERIOD):\n");
            user_prompt.push_str(prev);
            user_prompt.push('\n');
        }

        user_prompt.push_str("\nCURRENT PERIOD EVENTS (JSON LIST):\n");
        user_prompt.push_str(&events_json);
        user_prompt.push_str(
            "\n\nTASK:\n\
             - Based ONLY on these events, write ONE new diary-style paragraph.\n\
             - Respect all factual and stylistic constraints from the system prompt.\n\
             - Do NOT invent new major events; stay within the JSON.\n\
             - Aim for ~150-300 words, one paragraph.",
        );

        let raw = self
            .backend
            .complete_text(&self.system_prompt, &user_prompt)
            .await?;

        // Whatever whitespace the service returns, the contract is one
        // line of text.
        Ok(collapse_to_single_paragraph(&raw))
    }

    /// Narrate a whole storyline into a diary.
    ///
    /// Periods are processed strictly in canonical order; each call
    /// receives the previous call's return value verbatim, including
    /// the empty string produced by an event-less period. Any failed
    /// call aborts the run; no partial diary is returned.
    pub async fn narrativize_storyline(&self, storyline: &Storyline) -> Result<Diary, GenError> {
        let mut entries = BTreeMap::new();
        let mut previous_paragraph = String::new();

        for (key, period) in storyline.periods() {
            debug!(period = %key, events = period.events.len(), "narrating period");
            let paragraph = self.narrativize(&period.events, &previous_paragraph).await?;

            entries.insert(
                key,
                DiaryEntry {
                    timeframe: period.timeframe.clone(),
                    summary: period.summary.clone(),
                    diary_paragraph: paragraph.clone(),
                },
            );

            previous_paragraph = paragraph;
        }

        info!(periods = entries.len(), "diary complete");
        Ok(Diary { entries })
    }
}

fn collapse_to_single_paragraph(raw: &str) -> String {
    raw.lines().collect::<Vec<_>>().join(" ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storyline::EventCategory;
    use crate::testing::MockBackend;

    fn event(description: &str) -> Event {
        Event {
            category: EventCategory::DirectTrigger,
            description: description.to_string(),
            domain: "work".to_string(),
            extra: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn test_empty_events_short_circuit() {
        let backend = Arc::new(MockBackend::new());
        let chainer = NarrativeChainer::new(backend.clone());

        let paragraph = chainer
            .narrativize(&[], "some previous paragraph")
            .await
            .unwrap();

        assert_eq!(paragraph, "");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_output_is_single_line() {
        let backend =
            Arc::new(MockBackend::with_responses(["First line.\nSecond line.\n\nThird."]));
        let chainer = NarrativeChainer::new(backend);

        let paragraph = chainer.narrativize(&[event("e1")], "").await.unwrap();
        assert!(!paragraph.contains('\n'));
        assert_eq!(paragraph, "First line. Second line.  Third.");
    }

    #[tokio::test]
    async fn test_previous_paragraph_included_verbatim() {
        let backend = Arc::new(MockBackend::with_responses(["a paragraph"]));
        let chainer = NarrativeChainer::new(backend.clone());

        chainer
            .narrativize(&[event("e1")], "  yesterday was hard  ")
            .await
            .unwrap();

        let call = backend.last_call().unwrap();
        assert!(call.user.contains("PREVIOUS DIARY PARAGRAPH"));
        assert!(call.user.contains("yesterday was hard"));
    }

    #[tokio::test]
    async fn test_no_previous_paragraph_instruction() {
        let backend = Arc::new(MockBackend::with_responses(["a paragraph"]));
        let chainer = NarrativeChainer::new(backend.clone());

        chainer.narrativize(&[event("e1")], "   ").await.unwrap();

        let call = backend.last_call().unwrap();
        assert!(call.user.contains("NO previous diary paragraph"));
        assert!(!call.user.contains("PREVIOUS DIARY PARAGRAPH"));
    }
}
