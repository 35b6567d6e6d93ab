//! Public protocol structs for the HTTP endpoints (serde ready).
//! Field names follow what the browser game already sends and reads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::Dataset;
use crate::domain::{Category, DatasetKind, Question, Session};
use crate::logic::Authority;

/// DTO for one question. Character and letter questions expose their
/// pronunciation and example words under the names each front-end expects.
#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub id: String,
    pub image: Option<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    pub options: Vec<String>,
    #[serde(rename = "voiceText")]
    pub voice_text: String,
    pub category: String,
    pub meaning: String,
    #[serde(flatten)]
    pub details: QuestionDetails,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QuestionDetails {
    Character {
        pinyin: String,
        #[serde(rename = "chineseMeaning", skip_serializing_if = "Option::is_none")]
        chinese_meaning: Option<String>,
        common_words: Vec<String>,
    },
    Letter {
        pronunciation: String,
        phonetic: Option<String>,
        words: Vec<String>,
    },
}

/// Convert an internal `Question` to the public DTO.
pub fn to_out(q: &Question) -> QuestionOut {
    let details = match q.kind {
        DatasetKind::Characters => QuestionDetails::Character {
            pinyin: q.pronunciation.clone(),
            chinese_meaning: q.native_meaning.clone(),
            common_words: q.example_words.clone(),
        },
        DatasetKind::Letters => QuestionDetails::Letter {
            pronunciation: q.pronunciation.clone(),
            phonetic: q.phonetic.clone(),
            words: q.example_words.clone(),
        },
    };
    QuestionOut {
        id: q.id.clone(),
        image: q.image.clone(),
        correct_answer: q.correct_answer.clone(),
        options: q.options.clone(),
        voice_text: q.voice_text.clone(),
        category: q.category.clone(),
        meaning: q.meaning.clone(),
        details,
    }
}

#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub questions: Vec<QuestionOut>,
    #[serde(rename = "totalQuestions")]
    pub total_questions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_type: Option<String>,
}

impl SessionOut {
    pub fn new(session: &Session, game_type: Option<String>) -> Self {
        Self {
            questions: session.questions.iter().map(to_out).collect(),
            total_questions: session.total,
            game_type,
        }
    }
}

//
// Query strings / request bodies
//

#[derive(Debug, Default, Deserialize)]
pub struct QuestionQuery {
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    /// Comma-separated symbols the player saw recently.
    pub recent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LetterSessionIn {
    #[serde(default)]
    pub game_type: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub recent: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub answer: String,
    #[serde(rename = "questionId", default)]
    pub question_id: Option<String>,
    #[serde(rename = "correctAnswer", default)]
    pub correct_answer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnswerOut {
    pub correct: bool,
    pub message: String,
    pub authority: Authority,
}

/// Raw score body; numeric fields stay untyped so validation can explain
/// exactly what is wrong with them.
#[derive(Debug, Deserialize)]
pub struct ScoreIn {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub score: Option<Value>,
    #[serde(rename = "totalTimeMs", alias = "total_time", alias = "totalTime", default)]
    pub total_time_ms: Option<Value>,
    #[serde(rename = "avgTimeMs", alias = "average_time", alias = "averageTime", default)]
    pub avg_time_ms: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ScoreOut {
    pub success: bool,
    pub rank: i64,
    pub message: String,
    pub record: crate::domain::ScoreRecord,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardOut {
    pub leaderboard: Vec<crate::store::RankedScore>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackIn {
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub image_file: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackOut {
    pub success: bool,
    pub count: i64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackListOut {
    pub feedback: Vec<crate::domain::FeedbackCount>,
}

//
// Reference data, in the same shape as the dataset files
//

#[derive(Debug, Serialize)]
pub struct CharacterOut {
    pub character: String,
    pub pinyin: String,
    pub meaning: String,
    pub chinese_meaning: Option<String>,
    pub common_words: Vec<String>,
    pub image_file: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CharacterCategoryOut {
    pub category: String,
    pub characters: Vec<CharacterOut>,
}

impl From<&Category> for CharacterCategoryOut {
    fn from(c: &Category) -> Self {
        let characters = c
            .entries
            .iter()
            .map(|e| CharacterOut {
                character: e.symbol.clone(),
                pinyin: e.pronunciation.clone(),
                meaning: e.meaning.clone(),
                chinese_meaning: e.native_meaning.clone(),
                common_words: e.example_words.clone(),
                image_file: e.image_file.clone(),
            })
            .collect();
        Self { category: c.name.clone(), characters }
    }
}

#[derive(Debug, Serialize)]
pub struct CharactersOut {
    #[serde(rename = "basicChineseCharactersForKids")]
    pub categories: Vec<CharacterCategoryOut>,
}

impl From<&Dataset> for CharactersOut {
    fn from(ds: &Dataset) -> Self {
        Self { categories: ds.categories.iter().map(CharacterCategoryOut::from).collect() }
    }
}

#[derive(Debug, Serialize)]
pub struct LetterOut {
    pub letter: String,
    pub pronunciation: String,
    pub phonetic: Option<String>,
    pub meaning: String,
    pub words: Vec<String>,
    pub image_file: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LetterCategoryOut {
    pub category: String,
    pub letters: Vec<LetterOut>,
}

#[derive(Debug, Serialize)]
pub struct LettersOut {
    #[serde(rename = "englishAlphabetForKids")]
    pub categories: Vec<LetterCategoryOut>,
}

impl From<&Dataset> for LettersOut {
    fn from(ds: &Dataset) -> Self {
        let categories = ds
            .categories
            .iter()
            .map(|c| LetterCategoryOut {
                category: c.name.clone(),
                letters: c
                    .entries
                    .iter()
                    .map(|e| LetterOut {
                        letter: e.symbol.clone(),
                        pronunciation: e.pronunciation.clone(),
                        phonetic: e.phonetic.clone(),
                        meaning: e.meaning.clone(),
                        words: e.example_words.clone(),
                        image_file: e.image_file.clone(),
                    })
                    .collect(),
            })
            .collect();
        Self { categories }
    }
}

#[derive(Debug, Serialize)]
pub struct AlphabetLetterOut {
    pub letter: String,
    pub pronunciation: String,
    pub phonetic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AbcSongOut {
    pub song_lyrics: String,
    pub alphabet: Vec<AlphabetLetterOut>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
