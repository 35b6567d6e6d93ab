//! Core game behaviors shared by the character and letter games.
//!
//! This includes:
//!   - Generating one multiple-choice question (category fallback, exclusions, distractors)
//!   - Building a session batch while avoiding repeated answers
//!   - Judging a submitted answer against the server key or the client's claim
//!
//! Randomness is always injected so callers (and tests) pick the RNG.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::dataset::Dataset;
use crate::domain::{CategoryEntry, Difficulty, Question, Session};
use crate::error::AppError;
use crate::util::fill_template;

/// Dataset-specific presentation bits attached to each question.
#[derive(Clone, Copy, Debug)]
pub struct Presentation<'a> {
  pub voice_template: &'a str,
  pub image_url_prefix: &'a str,
}

/// Draw one question.
///
/// An unknown `category` silently falls back to a random one. The correct
/// entry avoids `excluded` symbols, widening first to all categories and
/// finally ignoring exclusions once everything has been used.
#[instrument(level = "debug", skip(ds, pres, excluded, rng), fields(kind = ?ds.kind, excluded = excluded.len()))]
pub fn generate_question<R: Rng + ?Sized>(
  ds: &Dataset,
  pres: Presentation<'_>,
  category: Option<&str>,
  difficulty: Difficulty,
  excluded: &HashSet<String>,
  rng: &mut R,
) -> Result<Question, AppError> {
  let resolved = match category.and_then(|name| ds.category(name)) {
    Some(c) => c,
    None => {
      if let Some(name) = category {
        debug!(target: "game", requested = %name, "Unknown category; picking a random one");
      }
      ds.categories.choose(rng).ok_or(AppError::EmptyPool)?
    }
  };

  let in_category: Vec<(&str, &CategoryEntry)> = resolved
    .entries
    .iter()
    .filter(|e| !excluded.contains(&e.symbol))
    .map(|e| (resolved.name.as_str(), e))
    .collect();

  let (category_name, correct) = match in_category.choose(rng) {
    Some(pick) => *pick,
    None => {
      let widened: Vec<(&str, &CategoryEntry)> = ds
        .all_entries()
        .filter(|(_, e)| !excluded.contains(&e.symbol))
        .collect();
      match widened.choose(rng) {
        Some(pick) => {
          debug!(target: "game", category = %resolved.name, "Category exhausted; widened to all categories");
          *pick
        }
        None => {
          debug!(target: "game", category = %resolved.name, "Whole pool exhausted; ignoring exclusions");
          let e = resolved.entries.choose(rng).ok_or(AppError::EmptyPool)?;
          (resolved.name.as_str(), e)
        }
      }
    }
  };

  // Distinct symbols only, so options never repeat even if the dictionary does.
  let mut seen: HashSet<&str> = HashSet::new();
  seen.insert(correct.symbol.as_str());
  let distractor_pool: Vec<&str> = ds
    .all_entries()
    .map(|(_, e)| e.symbol.as_str())
    .filter(|s| seen.insert(*s))
    .collect();

  let mut options: Vec<String> = distractor_pool
    .choose_multiple(rng, difficulty.option_count() - 1)
    .map(|s| s.to_string())
    .collect();
  options.push(correct.symbol.clone());
  options.shuffle(rng);

  Ok(Question {
    id: Uuid::new_v4().to_string(),
    kind: ds.kind,
    category: category_name.to_string(),
    image: correct
      .image_file
      .as_ref()
      .map(|f| format!("{}{}", pres.image_url_prefix, f)),
    correct_answer: correct.symbol.clone(),
    options,
    voice_text: fill_template(pres.voice_template, &[("symbol", correct.symbol.as_str())]),
    pronunciation: correct.pronunciation.clone(),
    phonetic: correct.phonetic.clone(),
    meaning: correct.meaning.clone(),
    native_meaning: correct.native_meaning.clone(),
    example_words: correct.example_words.clone(),
  })
}

/// Build a batch of `size` questions.
///
/// `recent` seeds the exclusion set and every drawn answer joins the current
/// cycle. Once `recent` plus the cycle covers the whole pool, `recent` is
/// dropped; once the cycle alone covers it, a new cycle starts that still
/// avoids the previous answer. Answers therefore repeat only across cycles
/// and never back to back while the pool has more than one symbol.
#[instrument(level = "debug", skip(ds, pres, recent, rng), fields(kind = ?ds.kind, recent = recent.len()))]
pub fn start_session<R: Rng + ?Sized>(
  ds: &Dataset,
  pres: Presentation<'_>,
  category: Option<&str>,
  difficulty: Difficulty,
  recent: &[String],
  size: usize,
  rng: &mut R,
) -> Result<Session, AppError> {
  let pool: HashSet<&str> = ds.all_entries().map(|(_, e)| e.symbol.as_str()).collect();
  let covers = |set: &HashSet<String>| pool.iter().all(|s| set.contains(*s));

  let mut recent: HashSet<String> = recent.iter().cloned().collect();
  let mut cycle: HashSet<String> = HashSet::new();
  let mut questions: Vec<Question> = Vec::with_capacity(size);

  for _ in 0..size {
    if !cycle.is_empty() && covers(&cycle) {
      debug!(target: "game", used = cycle.len(), "Pool cycled; starting over");
      cycle.clear();
    }
    let mut excluded = cycle.clone();
    if cycle.is_empty() && pool.len() > 1 {
      if let Some(last) = questions.last() {
        excluded.insert(last.correct_answer.clone());
      }
    }
    if !recent.is_empty() {
      let with_recent: HashSet<String> = excluded.union(&recent).cloned().collect();
      if covers(&with_recent) {
        debug!(target: "game", recent = recent.len(), "Recent symbols cover the pool; no longer avoiding them");
        recent.clear();
      } else {
        excluded = with_recent;
      }
    }

    let q = generate_question(ds, pres, category, difficulty, &excluded, rng)?;
    cycle.insert(q.correct_answer.clone());
    questions.push(q);
  }
  Ok(Session { total: questions.len(), questions })
}

/// Who decided correctness.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
  Server,
  Client,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verdict {
  pub correct: bool,
  pub authority: Authority,
}

/// The server key wins when present; otherwise the client's claimed answer is used.
pub fn judge_answer(answer: &str, server_key: Option<&str>, claimed: Option<&str>) -> Result<Verdict, AppError> {
  let (expected, authority) = match (server_key, claimed) {
    (Some(key), _) => (key, Authority::Server),
    (None, Some(c)) => (c, Authority::Client),
    (None, None) => {
      return Err(AppError::validation("unknown questionId and no correctAnswer supplied"));
    }
  };
  Ok(Verdict { correct: answer.trim() == expected.trim(), authority })
}
