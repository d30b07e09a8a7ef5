//! Reusable, client-independent system prompts.
//!
//! The storyline and narrator specifications are bundled into the
//! binary, with an explicit override path for deployments that tune
//! them on disk. Components receive their prompt at construction; there
//! is no process-wide path state.

use std::io;
use std::path::Path;

/// The pair of system-level specifications the pipeline consumes.
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// System specification for storyline synthesis (event schema and
    /// JSON output contract).
    pub storyline_system: String,
    /// System specification for diary narration (style contract).
    pub narrator_system: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            storyline_system: include_str!("prompts/storyline_system.txt").to_string(),
            narrator_system: include_str!("prompts/narrator_system.txt").to_string(),
        }
    }
}

impl PromptSet {
    /// Load both prompts from a directory containing
    /// `storyline_system.txt` and `narrator_system.txt`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, io::Error> {
        let dir = dir.as_ref();
        Ok(Self {
            storyline_system: std::fs::read_to_string(dir.join("storyline_system.txt"))?,
            narrator_system: std::fs::read_to_string(dir.join("narrator_system.txt"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_prompts_nonempty() {
        let prompts = PromptSet::default();
        assert!(!prompts.storyline_system.trim().is_empty());
        assert!(!prompts.narrator_system.trim().is_empty());
    }

    #[test]
    fn test_from_dir_missing_is_io_error() {
        let err = PromptSet::from_dir("/nonexistent/prompt/dir").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
