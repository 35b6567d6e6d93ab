//! Reference dataset: the character/letter dictionaries the game draws from.
//!
//! Loaded once at startup and shared read-only. Two on-disk shapes are
//! accepted:
//!
//! ```json
//! {"basicChineseCharactersForKids": [{"category": "自然", "characters": [
//!   {"character": "日", "pinyin": "rì", "meaning": "sun", "chinese_meaning": "太阳",
//!    "common_words": ["日出"], "image_file": "日_rì.jpg"}]}]}
//!
//! {"englishAlphabetForKids": [{"category": "Vowels", "letters": [
//!   {"letter": "A", "pronunciation": "ei", "phonetic": "/eɪ/", "words": ["apple"],
//!    "image_file": "A_apple.jpg"}]}]}
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::domain::{Category, CategoryEntry, DatasetKind};
use crate::pinyin::to_pinyin_diacritics;

#[derive(Debug, Error)]
pub enum DatasetError {
  #[error("failed to read dataset {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse dataset {path}: {source}")]
  Json {
    path: String,
    #[source]
    source: serde_json::Error,
  },
  #[error("dataset {0} contains no entries")]
  Empty(String),
}

/// Immutable collection of categories. Never empty once constructed.
#[derive(Clone, Debug)]
pub struct Dataset {
  pub kind: DatasetKind,
  pub categories: Vec<Category>,
}

impl Dataset {
  /// Build a dataset, dropping empty categories; fails if nothing is left.
  pub fn new(kind: DatasetKind, categories: Vec<Category>, origin: &str) -> Result<Self, DatasetError> {
    let categories: Vec<Category> = categories.into_iter().filter(|c| !c.entries.is_empty()).collect();
    if categories.is_empty() {
      return Err(DatasetError::Empty(origin.to_string()));
    }
    Ok(Self { kind, categories })
  }

  pub fn category(&self, name: &str) -> Option<&Category> {
    self.categories.iter().find(|c| c.name == name)
  }

  pub fn category_names(&self) -> Vec<String> {
    self.categories.iter().map(|c| c.name.clone()).collect()
  }

  /// Every entry paired with its category name, in dataset order.
  pub fn all_entries(&self) -> impl Iterator<Item = (&str, &CategoryEntry)> {
    self
      .categories
      .iter()
      .flat_map(|c| c.entries.iter().map(move |e| (c.name.as_str(), e)))
  }

  pub fn entry_count(&self) -> usize {
    self.categories.iter().map(|c| c.entries.len()).sum()
  }
}

// ---- On-disk shapes ----

#[derive(Deserialize)]
struct CharacterFile {
  #[serde(rename = "basicChineseCharactersForKids")]
  categories: Vec<CharacterCategoryRecord>,
}

#[derive(Deserialize)]
struct CharacterCategoryRecord {
  category: String,
  #[serde(default)]
  characters: Vec<CharacterRecord>,
}

#[derive(Deserialize)]
struct CharacterRecord {
  character: String,
  #[serde(default)]
  pinyin: String,
  #[serde(default)]
  meaning: String,
  #[serde(default)]
  chinese_meaning: Option<String>,
  #[serde(default)]
  common_words: Vec<String>,
  #[serde(default)]
  image_file: Option<String>,
}

impl From<CharacterRecord> for CategoryEntry {
  fn from(r: CharacterRecord) -> Self {
    let pronunciation = if r.pinyin.trim().is_empty() {
      to_pinyin_diacritics(&r.character)
    } else {
      r.pinyin
    };
    CategoryEntry {
      symbol: r.character,
      pronunciation,
      phonetic: None,
      meaning: r.meaning,
      native_meaning: r.chinese_meaning,
      example_words: r.common_words,
      image_file: r.image_file.filter(|f| !f.trim().is_empty()),
    }
  }
}

#[derive(Deserialize)]
struct LetterFile {
  #[serde(rename = "englishAlphabetForKids")]
  categories: Vec<LetterCategoryRecord>,
}

#[derive(Deserialize)]
struct LetterCategoryRecord {
  category: String,
  #[serde(default)]
  letters: Vec<LetterRecord>,
}

#[derive(Deserialize)]
struct LetterRecord {
  letter: String,
  #[serde(default)]
  pronunciation: String,
  #[serde(default)]
  phonetic: Option<String>,
  #[serde(default)]
  meaning: String,
  #[serde(default)]
  words: Vec<String>,
  #[serde(default)]
  image_file: Option<String>,
}

impl From<LetterRecord> for CategoryEntry {
  fn from(r: LetterRecord) -> Self {
    CategoryEntry {
      symbol: r.letter,
      pronunciation: r.pronunciation,
      phonetic: r.phonetic,
      meaning: r.meaning,
      native_meaning: None,
      example_words: r.words,
      image_file: r.image_file.filter(|f| !f.trim().is_empty()),
    }
  }
}

pub fn parse_characters(json: &str, origin: &str) -> Result<Dataset, DatasetError> {
  let file: CharacterFile = serde_json::from_str(json)
    .map_err(|source| DatasetError::Json { path: origin.to_string(), source })?;
  let categories = file
    .categories
    .into_iter()
    .map(|c| Category { name: c.category, entries: c.characters.into_iter().map(Into::into).collect() })
    .collect();
  Dataset::new(DatasetKind::Characters, categories, origin)
}

pub fn parse_letters(json: &str, origin: &str) -> Result<Dataset, DatasetError> {
  let file: LetterFile = serde_json::from_str(json)
    .map_err(|source| DatasetError::Json { path: origin.to_string(), source })?;
  let categories = file
    .categories
    .into_iter()
    .map(|c| Category { name: c.category, entries: c.letters.into_iter().map(Into::into).collect() })
    .collect();
  Dataset::new(DatasetKind::Letters, categories, origin)
}

#[instrument(level = "info")]
pub fn load_characters(path: &str) -> Result<Dataset, DatasetError> {
  let json = std::fs::read_to_string(path).map_err(|source| DatasetError::Io { path: path.to_string(), source })?;
  let ds = parse_characters(&json, path)?;
  info!(target: "hanzi_island", %path, categories = ds.categories.len(), entries = ds.entry_count(), "Loaded character dataset");
  Ok(ds)
}

/// Letters are optional on disk: a missing file means the built-in alphabet.
#[instrument(level = "info")]
pub fn load_letters_or_builtin(path: &str) -> Result<Dataset, DatasetError> {
  if !Path::new(path).exists() {
    warn!(target: "hanzi_island", %path, "Letter dataset not found; using built-in alphabet");
    return Ok(crate::seeds::alphabet_dataset());
  }
  let json = std::fs::read_to_string(path).map_err(|source| DatasetError::Io { path: path.to_string(), source })?;
  let ds = parse_letters(&json, path)?;
  info!(target: "hanzi_island", %path, categories = ds.categories.len(), entries = ds.entry_count(), "Loaded letter dataset");
  Ok(ds)
}
