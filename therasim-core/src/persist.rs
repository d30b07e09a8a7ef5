//! Storyline and diary file I/O.
//!
//! One JSON artifact per run: storylines land under `output_storylines/`
//! and diaries under an `output_diaries/` directory next to the source
//! storyline, both with timestamp-derived names.

use crate::narrator::Diary;
use crate::storyline::Storyline;
use chrono::Local;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load a storyline document from disk.
pub async fn load_storyline(path: impl AsRef<Path>) -> Result<Storyline, PersistError> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Save a storyline under `out_dir/output_storylines/` with a
/// timestamped name. Returns the written path.
pub async fn save_storyline(
    storyline: &Storyline,
    out_dir: impl AsRef<Path>,
) -> Result<PathBuf, PersistError> {
    let dir = out_dir.as_ref().join("output_storylines");
    fs::create_dir_all(&dir).await?;

    let name = format!("storyline_{}.json", timestamp());
    let path = dir.join(name);

    let content = serde_json::to_string_pretty(storyline)?;
    fs::write(&path, content).await?;
    Ok(path)
}

/// Save a diary next to its source storyline, under `output_diaries/`,
/// named after the storyline file. Returns the written path.
pub async fn save_diary(
    diary: &Diary,
    storyline_path: impl AsRef<Path>,
) -> Result<PathBuf, PersistError> {
    let storyline_path = storyline_path.as_ref();
    let base_dir = storyline_path.parent().unwrap_or_else(|| Path::new("."));

    let out_dir = base_dir.join("output_diaries");
    fs::create_dir_all(&out_dir).await?;

    let stem = storyline_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("storyline");
    let name = format!("{stem}_diary_{}.json", timestamp());
    let path = out_dir.join(name);

    let content = serde_json::to_string_pretty(diary)?;
    fs::write(&path, content).await?;
    Ok(path)
}

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrator::DiaryEntry;
    use crate::storyline::{PeriodData, PeriodKey};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_storyline_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let mut storyline = Storyline::new();
        storyline.insert(
            PeriodKey::BeforeSession1,
            PeriodData {
                timeframe: "week 0".to_string(),
                summary: "intro".to_string(),
                events: vec![],
            },
        );

        let path = save_storyline(&storyline, temp_dir.path()).await.unwrap();
        assert!(path.to_string_lossy().contains("output_storylines"));

        let loaded = load_storyline(&path).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(PeriodKey::BeforeSession1).unwrap().summary, "intro");
    }

    #[tokio::test]
    async fn test_save_diary_sibling_dir_and_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storyline_path = temp_dir.path().join("storyline_20250207_162355.json");
        fs::write(&storyline_path, "{}").await.unwrap();

        let mut diary = Diary::default();
        diary.insert(
            PeriodKey::BeforeSession1,
            DiaryEntry {
                timeframe: "week 0".to_string(),
                summary: "intro".to_string(),
                diary_paragraph: String::new(),
            },
        );

        let path = save_diary(&diary, &storyline_path).await.unwrap();
        assert_eq!(path.parent().unwrap(), temp_dir.path().join("output_diaries"));

        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("storyline_20250207_162355_diary_"));
        assert!(name.ends_with(".json"));

        // The artifact parses back as a diary.
        let content = fs::read_to_string(&path).await.unwrap();
        let loaded: Diary = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_storyline_is_io_error() {
        let err = load_storyline("/nonexistent/storyline.json").await.unwrap_err();
        assert!(matches!(err, PersistError::Io(_)));
    }

    #[tokio::test]
    async fn test_load_malformed_storyline_is_json_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "not json").await.unwrap();

        let err = load_storyline(&path).await.unwrap_err();
        assert!(matches!(err, PersistError::Json(_)));
    }
}
