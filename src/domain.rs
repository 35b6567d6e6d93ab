//! Domain models: difficulty, reference dataset, questions, and stored records.

use serde::{Deserialize, Serialize};

/// How many options a question offers.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub fn option_count(self) -> usize {
    match self {
      Difficulty::Easy => 2,
      Difficulty::Medium => 3,
      Difficulty::Hard => 4,
    }
  }

  /// Lenient query parsing: absent → `default`, unknown → hard.
  pub fn from_param(raw: Option<&str>, default: Difficulty) -> Difficulty {
    match raw.map(|s| s.trim().to_ascii_lowercase()) {
      None => default,
      Some(s) if s.is_empty() => default,
      Some(s) => match s.as_str() {
        "easy" => Difficulty::Easy,
        "medium" => Difficulty::Medium,
        _ => Difficulty::Hard,
      },
    }
  }
}

/// Which game a dataset (and its questions) belongs to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
  Characters,
  Letters,
}

/// One symbol of the reference dictionary.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CategoryEntry {
  pub symbol: String,
  /// Pinyin for characters, spoken name for letters.
  pub pronunciation: String,
  #[serde(default)]
  pub phonetic: Option<String>,
  #[serde(default)]
  pub meaning: String,
  #[serde(default)]
  pub native_meaning: Option<String>,
  #[serde(default)]
  pub example_words: Vec<String>,
  #[serde(default)]
  pub image_file: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Category {
  pub name: String,
  pub entries: Vec<CategoryEntry>,
}

/// A generated multiple-choice question. Lives only until it is delivered.
#[derive(Clone, Debug, PartialEq)]
pub struct Question {
  pub id: String,
  pub kind: DatasetKind,
  pub category: String,
  pub image: Option<String>,
  pub correct_answer: String,
  pub options: Vec<String>,
  pub voice_text: String,
  pub pronunciation: String,
  pub phonetic: Option<String>,
  pub meaning: String,
  pub native_meaning: Option<String>,
  pub example_words: Vec<String>,
}

/// A batch of questions for one play-through.
#[derive(Clone, Debug)]
pub struct Session {
  pub questions: Vec<Question>,
  pub total: usize,
}

/// Stored leaderboard row.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
  pub id: i64,
  pub nickname: String,
  pub score: i64,
  pub total_time_ms: i64,
  pub avg_time_ms: i64,
  pub created_at: String,
}

/// Stored image-mismatch feedback counter.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct FeedbackCount {
  #[serde(rename = "character")]
  pub symbol: String,
  pub image_file: String,
  pub count: i64,
  pub updated_at: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn difficulty_params_are_lenient() {
    assert_eq!(Difficulty::from_param(None, Difficulty::Medium), Difficulty::Medium);
    assert_eq!(Difficulty::from_param(Some(" EASY "), Difficulty::Medium), Difficulty::Easy);
    assert_eq!(Difficulty::from_param(Some("expert"), Difficulty::Easy), Difficulty::Hard);
    assert_eq!(Difficulty::Hard.option_count(), 4);
  }
}
