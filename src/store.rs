//! SQLite-backed leaderboard and image-feedback counters.
//!
//! Every submission is kept as its own row; a player's repeated games form a
//! history rather than overwriting a best score. Each write runs in one short
//! transaction on a pooled connection.

use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::domain::{FeedbackCount, ScoreRecord};
use crate::error::AppError;
use crate::protocol::{FeedbackIn, ScoreIn};

const MAX_NICKNAME_CHARS: usize = 32;

const SCHEMA: [&str; 3] = [
  r#"CREATE TABLE IF NOT EXISTS scores (
      id            INTEGER PRIMARY KEY AUTOINCREMENT,
      nickname      TEXT    NOT NULL,
      score         INTEGER NOT NULL CHECK (score >= 0),
      total_time_ms INTEGER NOT NULL CHECK (total_time_ms >= 0),
      avg_time_ms   INTEGER NOT NULL CHECK (avg_time_ms >= 0),
      created_at    TEXT    NOT NULL
    )"#,
  r#"CREATE INDEX IF NOT EXISTS idx_scores_rank ON scores (score DESC, total_time_ms ASC)"#,
  r#"CREATE TABLE IF NOT EXISTS feedback (
      id         INTEGER PRIMARY KEY AUTOINCREMENT,
      symbol     TEXT    NOT NULL,
      image_file TEXT    NOT NULL,
      count      INTEGER NOT NULL DEFAULT 1,
      created_at TEXT    NOT NULL,
      updated_at TEXT    NOT NULL,
      UNIQUE (symbol, image_file)
    )"#,
];

/// Open (creating if needed) the database and make sure the tables exist.
#[instrument(level = "info")]
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
  let opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
  let pool = SqlitePoolOptions::new().max_connections(5).connect_with(opts).await?;
  init_schema(&pool).await?;
  info!(target: "store", %database_url, "Database ready");
  Ok(pool)
}

/// Idempotent table creation.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
  for stmt in SCHEMA {
    sqlx::query(stmt).execute(pool).await?;
  }
  Ok(())
}

fn now_rfc3339() -> String {
  Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A score submission that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewScore {
  pub nickname: String,
  pub score: i64,
  pub total_time_ms: i64,
  pub avg_time_ms: i64,
}

impl NewScore {
  pub fn validate(raw: &ScoreIn) -> Result<Self, AppError> {
    let nickname = raw.nickname.as_deref().map(str::trim).unwrap_or_default();
    if nickname.is_empty() {
      return Err(AppError::validation("nickname must not be empty"));
    }
    if nickname.chars().count() > MAX_NICKNAME_CHARS {
      return Err(AppError::validation(format!("nickname must be at most {MAX_NICKNAME_CHARS} characters")));
    }
    Ok(Self {
      nickname: nickname.to_string(),
      score: non_negative_int("score", raw.score.as_ref())?,
      total_time_ms: non_negative_int("totalTimeMs", raw.total_time_ms.as_ref())?,
      avg_time_ms: non_negative_int("avgTimeMs", raw.avg_time_ms.as_ref())?,
    })
  }
}

fn non_negative_int(field: &str, v: Option<&Value>) -> Result<i64, AppError> {
  match v {
    None | Some(Value::Null) => Err(AppError::validation(format!("{field} is required"))),
    Some(Value::Number(n)) => match n.as_i64() {
      Some(i) if i >= 0 => Ok(i),
      Some(_) => Err(AppError::validation(format!("{field} must not be negative"))),
      None if n.is_u64() => Err(AppError::validation(format!("{field} is too large"))),
      None => Err(AppError::validation(format!("{field} must be an integer"))),
    },
    Some(_) => Err(AppError::validation(format!("{field} must be an integer"))),
  }
}

#[derive(Clone, Debug, Serialize)]
pub struct SubmittedScore {
  pub rank: i64,
  pub record: ScoreRecord,
}

/// Insert a score and compute its rank:
/// `1 + count(score > s OR (score = s AND total_time_ms < t))`.
#[instrument(level = "info", skip(pool), fields(nickname = %new.nickname, score = new.score))]
pub async fn submit_score(pool: &SqlitePool, new: &NewScore) -> Result<SubmittedScore, AppError> {
  let created_at = now_rfc3339();
  let mut tx = pool.begin().await?;

  let id = sqlx::query(
    "INSERT INTO scores (nickname, score, total_time_ms, avg_time_ms, created_at) VALUES (?, ?, ?, ?, ?)",
  )
  .bind(&new.nickname)
  .bind(new.score)
  .bind(new.total_time_ms)
  .bind(new.avg_time_ms)
  .bind(&created_at)
  .execute(&mut *tx)
  .await?
  .last_insert_rowid();

  let rank: i64 = sqlx::query_scalar(
    "SELECT COUNT(*) + 1 FROM scores WHERE score > ? OR (score = ? AND total_time_ms < ?)",
  )
  .bind(new.score)
  .bind(new.score)
  .bind(new.total_time_ms)
  .fetch_one(&mut *tx)
  .await?;

  tx.commit().await?;
  info!(target: "store", id, rank, "Score recorded");

  Ok(SubmittedScore {
    rank,
    record: ScoreRecord {
      id,
      nickname: new.nickname.clone(),
      score: new.score,
      total_time_ms: new.total_time_ms,
      avg_time_ms: new.avg_time_ms,
      created_at,
    },
  })
}

#[derive(Clone, Debug, Serialize)]
pub struct RankedScore {
  pub rank: i64,
  #[serde(flatten)]
  pub record: ScoreRecord,
}

/// Top `limit` rows by score desc, then total time asc.
#[instrument(level = "debug", skip(pool))]
pub async fn leaderboard(pool: &SqlitePool, limit: u32) -> Result<Vec<RankedScore>, AppError> {
  let rows: Vec<ScoreRecord> = sqlx::query_as(
    "SELECT id, nickname, score, total_time_ms, avg_time_ms, created_at FROM scores \
     ORDER BY score DESC, total_time_ms ASC, id ASC LIMIT ?",
  )
  .bind(i64::from(limit))
  .fetch_all(pool)
  .await?;
  Ok(assign_ranks(rows))
}

/// Competition ranking over already-sorted rows; rows equal on both keys share a rank.
fn assign_ranks(rows: Vec<ScoreRecord>) -> Vec<RankedScore> {
  let mut out: Vec<RankedScore> = Vec::with_capacity(rows.len());
  for (i, record) in rows.into_iter().enumerate() {
    let rank = match out.last() {
      Some(prev) if prev.record.score == record.score && prev.record.total_time_ms == record.total_time_ms => prev.rank,
      _ => i as i64 + 1,
    };
    out.push(RankedScore { rank, record });
  }
  out
}

/// Validated `(symbol, image_file)` key of a feedback report.
pub fn feedback_key(raw: &FeedbackIn) -> Result<(String, String), AppError> {
  let symbol = raw.character.as_deref().map(str::trim).unwrap_or_default();
  let image_file = raw.image_file.as_deref().map(str::trim).unwrap_or_default();
  if symbol.is_empty() || image_file.is_empty() {
    return Err(AppError::validation("character and image_file are required"));
  }
  Ok((symbol.to_string(), image_file.to_string()))
}

/// Insert-or-increment; returns the count after this report.
#[instrument(level = "info", skip(pool))]
pub async fn submit_feedback(pool: &SqlitePool, symbol: &str, image_file: &str) -> Result<i64, AppError> {
  let now = now_rfc3339();
  let count: i64 = sqlx::query_scalar(
    "INSERT INTO feedback (symbol, image_file, count, created_at, updated_at) VALUES (?, ?, 1, ?, ?) \
     ON CONFLICT(symbol, image_file) DO UPDATE SET count = count + 1, updated_at = excluded.updated_at \
     RETURNING count",
  )
  .bind(symbol)
  .bind(image_file)
  .bind(&now)
  .bind(&now)
  .fetch_one(pool)
  .await?;
  info!(target: "store", %symbol, %image_file, count, "Image feedback recorded");
  Ok(count)
}

#[instrument(level = "debug", skip(pool))]
pub async fn feedback_counts(pool: &SqlitePool) -> Result<Vec<FeedbackCount>, AppError> {
  let rows: Vec<FeedbackCount> = sqlx::query_as(
    "SELECT symbol, image_file, count, updated_at FROM feedback ORDER BY count DESC, symbol ASC, image_file ASC",
  )
  .fetch_all(pool)
  .await?;
  Ok(rows)
}

/// Single-connection in-memory database; every pooled connection would
/// otherwise get its own empty `:memory:` instance.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
  let pool = SqlitePoolOptions::new()
    .max_connections(1)
    .idle_timeout(None)
    .max_lifetime(None)
    .connect("sqlite::memory:")
    .await
    .expect("memory db");
  init_schema(&pool).await.expect("schema");
  pool
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn raw(v: Value) -> ScoreIn {
    serde_json::from_value(v).expect("score body")
  }

  fn score(nickname: &str, score: i64, total: i64) -> NewScore {
    NewScore { nickname: nickname.into(), score, total_time_ms: total, avg_time_ms: total / 10 }
  }

  #[test]
  fn validation_rejects_bad_submissions() {
    let empty = raw(json!({"nickname": "", "score": 10, "totalTimeMs": 1, "avgTimeMs": 1}));
    assert!(matches!(NewScore::validate(&empty), Err(AppError::Validation(_))));

    let negative = raw(json!({"nickname": "Alex", "score": -1, "totalTimeMs": 1, "avgTimeMs": 1}));
    assert!(matches!(NewScore::validate(&negative), Err(AppError::Validation(_))));

    let fractional = raw(json!({"nickname": "Alex", "score": 10, "totalTimeMs": 1.5, "avgTimeMs": 1}));
    assert!(matches!(NewScore::validate(&fractional), Err(AppError::Validation(_))));

    let text = raw(json!({"nickname": "Alex", "score": "10", "totalTimeMs": 1, "avgTimeMs": 1}));
    assert!(matches!(NewScore::validate(&text), Err(AppError::Validation(_))));

    let missing = raw(json!({"nickname": "Alex", "score": 10}));
    assert!(matches!(NewScore::validate(&missing), Err(AppError::Validation(_))));
  }

  #[test]
  fn nickname_length_counts_characters() {
    let max = "龙".repeat(MAX_NICKNAME_CHARS);
    let ok = raw(json!({"nickname": max, "score": 1, "totalTimeMs": 1, "avgTimeMs": 1}));
    assert_eq!(NewScore::validate(&ok).expect("valid").nickname.chars().count(), MAX_NICKNAME_CHARS);

    let long = raw(json!({"nickname": format!("{max}龙"), "score": 1, "totalTimeMs": 1, "avgTimeMs": 1}));
    assert!(matches!(NewScore::validate(&long), Err(AppError::Validation(_))));
  }

  #[test]
  fn validation_accepts_legacy_field_names() {
    let ok = raw(json!({"nickname": "  Alex ", "score": 100, "total_time": 5000, "average_time": 500}));
    let new = NewScore::validate(&ok).expect("valid");
    assert_eq!(new, NewScore { nickname: "Alex".into(), score: 100, total_time_ms: 5000, avg_time_ms: 500 });
  }

  #[tokio::test]
  async fn submit_returns_rank() {
    let pool = test_pool().await;
    let first = submit_score(&pool, &score("Alex", 100, 5000)).await.expect("submit");
    assert_eq!(first.rank, 1);
    assert!(first.record.id > 0);
    assert_eq!(first.record.avg_time_ms, 500);
  }

  #[tokio::test]
  async fn ranking_prefers_score_then_time() {
    let pool = test_pool().await;
    submit_score(&pool, &score("A", 100, 5000)).await.expect("A");
    let b = submit_score(&pool, &score("B", 100, 3000)).await.expect("B");
    assert_eq!(b.rank, 1);
    let c = submit_score(&pool, &score("C", 200, 9000)).await.expect("C");
    assert_eq!(c.rank, 1);

    let board = leaderboard(&pool, 20).await.expect("board");
    let names: Vec<&str> = board.iter().map(|r| r.record.nickname.as_str()).collect();
    assert_eq!(names, vec!["C", "B", "A"]);
    let ranks: Vec<i64> = board.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn repeated_nickname_keeps_history_and_ties_share_rank() {
    let pool = test_pool().await;
    submit_score(&pool, &score("Alex", 50, 4000)).await.expect("first");
    let again = submit_score(&pool, &score("Alex", 50, 4000)).await.expect("second");
    assert_eq!(again.rank, 1);
    let board = leaderboard(&pool, 1).await.expect("board");
    assert_eq!(board.len(), 1);
    let board = leaderboard(&pool, 10).await.expect("board");
    assert_eq!(board.len(), 2);
    assert!(board.iter().all(|r| r.rank == 1));
  }

  #[tokio::test]
  async fn feedback_increments_single_row() {
    let pool = test_pool().await;
    assert_eq!(submit_feedback(&pool, "日", "日_rì.jpg").await.expect("first"), 1);
    assert_eq!(submit_feedback(&pool, "日", "日_rì.jpg").await.expect("second"), 2);
    submit_feedback(&pool, "月", "月_yuè.jpg").await.expect("other");

    let rows = feedback_counts(&pool).await.expect("counts");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].symbol, "日");
    assert_eq!(rows[0].count, 2);
  }

  #[test]
  fn feedback_requires_both_fields() {
    let missing: FeedbackIn = serde_json::from_value(json!({"character": "日"})).expect("body");
    assert!(feedback_key(&missing).is_err());
    let ok: FeedbackIn = serde_json::from_value(json!({"character": "日", "image_file": "a.jpg"})).expect("body");
    assert_eq!(feedback_key(&ok).expect("key"), ("日".to_string(), "a.jpg".to_string()));
  }
}
