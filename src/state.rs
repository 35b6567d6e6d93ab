//! Application state: datasets, config, the score database, and answer keys.
//!
//! This module owns:
//!   - the character and letter datasets (read-only after startup)
//!   - the SQLite pool backing the leaderboard and feedback counters
//!   - the answer-key store that lets the server judge answers itself
//!
//! Nothing here is mutated per request except the answer keys.

use std::collections::{HashMap, HashSet, VecDeque};

use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::config::GameConfig;
use crate::dataset::Dataset;
use crate::domain::{DatasetKind, Difficulty, Question, Session};
use crate::error::AppError;
use crate::logic::{generate_question, judge_answer, start_session, Presentation, Verdict};

/// Bounded map of question id → correct symbol. Oldest ids are evicted first.
pub struct AnswerKeys {
    capacity: usize,
    inner: RwLock<AnswerKeysInner>,
}

#[derive(Default)]
struct AnswerKeysInner {
    by_id: HashMap<String, String>,
    order: VecDeque<String>,
}

impl AnswerKeys {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), inner: RwLock::new(AnswerKeysInner::default()) }
    }

    /// Record the answers of freshly issued questions.
    #[instrument(level = "debug", skip(self, questions), fields(count = questions.len()))]
    pub async fn remember(&self, questions: &[Question]) {
        let mut inner = self.inner.write().await;
        for q in questions {
            if inner.by_id.insert(q.id.clone(), q.correct_answer.clone()).is_none() {
                inner.order.push_back(q.id.clone());
            }
        }
        let mut evicted = 0usize;
        while inner.order.len() > self.capacity {
            if let Some(old) = inner.order.pop_front() {
                inner.by_id.remove(&old);
                evicted += 1;
            }
        }
        if evicted > 0 {
            debug!(target: "game", evicted, held = inner.by_id.len(), "Evicted oldest answer keys");
        }
    }

    pub async fn lookup(&self, question_id: &str) -> Option<String> {
        self.inner.read().await.by_id.get(question_id).cloned()
    }

}

pub struct AppState {
    pub config: GameConfig,
    pub characters: Dataset,
    pub letters: Dataset,
    pub pool: SqlitePool,
    pub answer_keys: AnswerKeys,
}

impl AppState {
    #[instrument(level = "info", skip_all)]
    pub fn new(config: GameConfig, characters: Dataset, letters: Dataset, pool: SqlitePool) -> Self {
        info!(
            target: "hanzi_island",
            characters = characters.entry_count(),
            character_categories = characters.categories.len(),
            letters = letters.entry_count(),
            session_size = config.session_size,
            "Startup game inventory"
        );
        let answer_keys = AnswerKeys::new(config.answer_key_capacity);
        Self { config, characters, letters, pool, answer_keys }
    }

    pub fn dataset(&self, kind: DatasetKind) -> &Dataset {
        match kind {
            DatasetKind::Characters => &self.characters,
            DatasetKind::Letters => &self.letters,
        }
    }

    pub fn presentation(&self, kind: DatasetKind) -> Presentation<'_> {
        let m = &self.config.messages;
        match kind {
            DatasetKind::Characters => Presentation {
                voice_template: &m.character_voice_template,
                image_url_prefix: &self.config.image_url_prefix,
            },
            DatasetKind::Letters => Presentation {
                voice_template: &m.letter_voice_template,
                image_url_prefix: &self.config.letter_image_url_prefix,
            },
        }
    }

    // The thread-local RNG is !Send, so drawing stays in sync fns and never spans an await.
    fn draw_question(&self, kind: DatasetKind, category: Option<&str>, difficulty: Difficulty) -> Result<Question, AppError> {
        let mut rng = rand::thread_rng();
        generate_question(self.dataset(kind), self.presentation(kind), category, difficulty, &HashSet::new(), &mut rng)
    }

    fn draw_session(
        &self,
        kind: DatasetKind,
        category: Option<&str>,
        difficulty: Difficulty,
        recent: &[String],
    ) -> Result<Session, AppError> {
        let mut rng = rand::thread_rng();
        start_session(
            self.dataset(kind),
            self.presentation(kind),
            category,
            difficulty,
            recent,
            self.config.session_size,
            &mut rng,
        )
    }

    /// Generate one question and keep its answer key.
    #[instrument(level = "info", skip(self))]
    pub async fn issue_question(
        &self,
        kind: DatasetKind,
        category: Option<&str>,
        difficulty: Difficulty,
    ) -> Result<Question, AppError> {
        let question = self.draw_question(kind, category, difficulty)?;
        self.answer_keys.remember(std::slice::from_ref(&question)).await;
        info!(target: "game", id = %question.id, category = %question.category, options = question.options.len(), "Question issued");
        Ok(question)
    }

    /// Generate a session batch and keep all of its answer keys.
    #[instrument(level = "info", skip(self, recent), fields(recent = recent.len()))]
    pub async fn issue_session(
        &self,
        kind: DatasetKind,
        category: Option<&str>,
        difficulty: Difficulty,
        recent: &[String],
    ) -> Result<Session, AppError> {
        let session = self.draw_session(kind, category, difficulty, recent)?;
        self.answer_keys.remember(&session.questions).await;
        info!(target: "game", total = session.total, "Session issued");
        Ok(session)
    }

    /// Judge an answer, preferring the stored key for `question_id`.
    #[instrument(level = "info", skip(self, answer, claimed))]
    pub async fn judge(&self, question_id: Option<&str>, answer: &str, claimed: Option<&str>) -> Result<Verdict, AppError> {
        let key = match question_id {
            Some(id) => self.answer_keys.lookup(id).await,
            None => None,
        };
        if question_id.is_some() && key.is_none() {
            debug!(target: "game", "Unknown or evicted question id; falling back to client answer");
        }
        judge_answer(answer, key.as_deref(), claimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, answer: &str) -> Question {
        Question {
            id: id.into(),
            kind: DatasetKind::Characters,
            category: "c".into(),
            image: None,
            correct_answer: answer.into(),
            options: vec![answer.into()],
            voice_text: String::new(),
            pronunciation: String::new(),
            phonetic: None,
            meaning: String::new(),
            native_meaning: None,
            example_words: vec![],
        }
    }

    #[tokio::test]
    async fn answer_keys_evict_oldest_first() {
        let keys = AnswerKeys::new(2);
        keys.remember(&[question("q1", "日"), question("q2", "月")]).await;
        keys.remember(&[question("q3", "山")]).await;
        assert_eq!(keys.lookup("q1").await, None);
        assert_eq!(keys.lookup("q2").await.as_deref(), Some("月"));
        assert_eq!(keys.lookup("q3").await.as_deref(), Some("山"));
    }

    #[tokio::test]
    async fn issued_session_answers_are_judged_by_server() {
        let state = test_state().await;
        let session = state.issue_session(DatasetKind::Characters, None, Difficulty::Hard, &[]).await.expect("session");
        assert_eq!(session.total, 10);
        let q = &session.questions[0];
        let wrong = q.options.iter().find(|o| **o != q.correct_answer).expect("distractor");

        // A client claiming its wrong pick was the right answer is not believed.
        let v = state.judge(Some(q.id.as_str()), wrong, Some(wrong.as_str())).await.expect("verdict");
        assert!(!v.correct);
        let v = state.judge(Some(q.id.as_str()), &q.correct_answer, None).await.expect("verdict");
        assert!(v.correct);
    }
}

/// State over a small character set, the built-in alphabet and an in-memory database.
#[cfg(test)]
pub async fn test_state() -> AppState {
    let json = r#"{"basicChineseCharactersForKids": [
      {"category": "自然", "characters": [
        {"character": "日", "pinyin": "rì", "meaning": "sun", "image_file": "日_rì.jpg"},
        {"character": "月", "pinyin": "yuè", "meaning": "moon"},
        {"character": "山", "pinyin": "shān", "meaning": "mountain"},
        {"character": "水", "pinyin": "shuǐ", "meaning": "water"},
        {"character": "火", "pinyin": "huǒ", "meaning": "fire"},
        {"character": "木", "pinyin": "mù", "meaning": "tree"}
      ]},
      {"category": "身体", "characters": [
        {"character": "口", "pinyin": "kǒu", "meaning": "mouth"},
        {"character": "目", "pinyin": "mù", "meaning": "eye"},
        {"character": "耳", "pinyin": "ěr", "meaning": "ear"},
        {"character": "手", "pinyin": "shǒu", "meaning": "hand"},
        {"character": "足", "pinyin": "zú", "meaning": "foot"},
        {"character": "心", "pinyin": "xīn", "meaning": "heart"}
      ]}
    ]}"#;
    let characters = crate::dataset::parse_characters(json, "test").expect("characters");
    let letters = crate::seeds::alphabet_dataset();
    AppState::new(GameConfig::default(), characters, letters, crate::store::test_pool().await)
}
