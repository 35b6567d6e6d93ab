//! HTTP endpoint handlers. These are thin wrappers that forward to state, logic and store.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use tracing::{info, instrument, warn};

use crate::domain::{DatasetKind, Difficulty};
use crate::error::AppError;
use crate::protocol::*;
use crate::routes::extract::{ApiJson, ApiQuery};
use crate::state::AppState;
use crate::store::{self, NewScore};
use crate::util::{fill_template, split_csv};

const LETTER_RECOGNITION: &str = "letter_recognition";

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true })
}

//
// Reference data
//

#[instrument(level = "info", skip(state))]
pub async fn http_get_characters(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(CharactersOut::from(&state.characters))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_categories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.characters.category_names())
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let cat = state
        .characters
        .category(&category)
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;
    Ok(Json(CharacterCategoryOut::from(cat)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_letters(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(LettersOut::from(&state.letters))
}

//
// Questions & sessions
//

#[instrument(level = "info", skip(state))]
pub async fn http_get_question(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<QuestionQuery>,
) -> Result<Json<QuestionOut>, AppError> {
    let difficulty = Difficulty::from_param(q.difficulty.as_deref(), Difficulty::Easy);
    let question = state
        .issue_question(DatasetKind::Characters, q.category.as_deref(), difficulty)
        .await?;
    Ok(Json(to_out(&question)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_question_in_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    ApiQuery(q): ApiQuery<QuestionQuery>,
) -> Result<Json<QuestionOut>, AppError> {
    let difficulty = Difficulty::from_param(q.difficulty.as_deref(), Difficulty::Easy);
    let question = state
        .issue_question(DatasetKind::Characters, Some(category.as_str()), difficulty)
        .await?;
    Ok(Json(to_out(&question)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_start_game(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<SessionQuery>,
) -> Result<Json<SessionOut>, AppError> {
    let difficulty = Difficulty::from_param(q.difficulty.as_deref(), Difficulty::Medium);
    let recent = q.recent.as_deref().map(split_csv).unwrap_or_default();
    let session = state
        .issue_session(DatasetKind::Characters, q.category.as_deref(), difficulty, &recent)
        .await?;
    Ok(Json(SessionOut::new(&session, None)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_letter_question(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<QuestionQuery>,
) -> Result<Json<QuestionOut>, AppError> {
    let difficulty = Difficulty::from_param(q.difficulty.as_deref(), Difficulty::Easy);
    let question = state
        .issue_question(DatasetKind::Letters, q.category.as_deref(), difficulty)
        .await?;
    Ok(Json(to_out(&question)))
}

#[instrument(level = "info", skip(state, body), fields(game_type = ?body.game_type, difficulty = ?body.difficulty))]
pub async fn http_start_letter_game(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LetterSessionIn>,
) -> Result<Json<SessionOut>, AppError> {
    let game_type = body.game_type.unwrap_or_else(|| LETTER_RECOGNITION.into());
    if game_type != LETTER_RECOGNITION {
        warn!(target: "game", %game_type, "Unknown letter game type; playing letter recognition");
    }
    let difficulty = Difficulty::from_param(body.difficulty.as_deref(), Difficulty::Easy);
    let session = state
        .issue_session(DatasetKind::Letters, body.category.as_deref(), difficulty, &body.recent)
        .await?;
    Ok(Json(SessionOut::new(&session, Some(game_type))))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_abc_song(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut alphabet: Vec<AlphabetLetterOut> = state
        .letters
        .all_entries()
        .map(|(_, e)| AlphabetLetterOut {
            letter: e.symbol.clone(),
            pronunciation: e.pronunciation.clone(),
            phonetic: e.phonetic.clone(),
        })
        .collect();
    alphabet.sort_by(|a, b| a.letter.cmp(&b.letter));
    alphabet.dedup_by(|a, b| a.letter == b.letter);
    Json(AbcSongOut { song_lyrics: state.config.messages.abc_song_lyrics.clone(), alphabet })
}

#[instrument(level = "info", skip(state, body), fields(question_id = ?body.question_id, answer_len = body.answer.len()))]
pub async fn http_post_answer(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<AnswerIn>,
) -> Result<Json<AnswerOut>, AppError> {
    let verdict = state
        .judge(body.question_id.as_deref(), &body.answer, body.correct_answer.as_deref())
        .await?;
    info!(target: "game", correct = verdict.correct, authority = ?verdict.authority, "Answer judged");
    let messages = &state.config.messages;
    let message = if verdict.correct { messages.correct.clone() } else { messages.wrong.clone() };
    Ok(Json(AnswerOut { correct: verdict.correct, message, authority: verdict.authority }))
}

//
// Leaderboard & feedback
//

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_score(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ScoreIn>,
) -> Result<Json<ScoreOut>, AppError> {
    let new = NewScore::validate(&body)?;
    let submitted = store::submit_score(&state.pool, &new).await?;
    let rank = submitted.rank.to_string();
    let message = fill_template(
        &state.config.messages.score_template,
        &[("nickname", new.nickname.as_str()), ("rank", rank.as_str())],
    );
    Ok(Json(ScoreOut { success: true, rank: submitted.rank, message, record: submitted.record }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_leaderboard(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<LeaderboardQuery>,
) -> Result<Json<LeaderboardOut>, AppError> {
    let max = state.config.leaderboard_max_limit.max(1);
    let limit = q.limit.unwrap_or(state.config.leaderboard_default_limit).clamp(1, max);
    let leaderboard = store::leaderboard(&state.pool, limit).await?;
    Ok(Json(LeaderboardOut { leaderboard }))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_feedback(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<FeedbackIn>,
) -> Result<Json<FeedbackOut>, AppError> {
    let (symbol, image_file) = store::feedback_key(&body)?;
    let count = store::submit_feedback(&state.pool, &symbol, &image_file).await?;
    Ok(Json(FeedbackOut { success: true, count, message: state.config.messages.feedback_thanks.clone() }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_feedback(State(state): State<Arc<AppState>>) -> Result<Json<FeedbackListOut>, AppError> {
    let feedback = store::feedback_counts(&state.pool).await?;
    Ok(Json(FeedbackListOut { feedback }))
}
