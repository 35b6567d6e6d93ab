//! Loading game configuration (paths, limits, message templates) from TOML.
//!
//! Every field has a default, so an absent or broken config file still yields
//! a runnable server. `PORT` and `DATABASE_URL` env vars win over the file.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GameConfig {
  pub port: u16,
  pub database_url: String,
  /// Character dictionary (`basicChineseCharactersForKids` JSON).
  pub characters_path: String,
  /// Letter dictionary; the built-in alphabet is used when the file is missing.
  pub letters_path: String,
  pub image_url_prefix: String,
  pub letter_image_url_prefix: String,
  pub session_size: usize,
  pub leaderboard_default_limit: u32,
  pub leaderboard_max_limit: u32,
  pub answer_key_capacity: usize,
  pub messages: Messages,
}

impl Default for GameConfig {
  fn default() -> Self {
    Self {
      port: 8080,
      database_url: "sqlite://game.db?mode=rwc".into(),
      characters_path: "data/characters.json".into(),
      letters_path: "data/letters.json".into(),
      image_url_prefix: "/static/images/".into(),
      letter_image_url_prefix: "/static/images/english/".into(),
      session_size: 10,
      leaderboard_default_limit: 20,
      leaderboard_max_limit: 100,
      answer_key_capacity: 10_000,
      messages: Messages::default(),
    }
  }
}

/// User-facing strings. `{symbol}`, `{nickname}` and `{rank}` are substituted.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Messages {
  pub character_voice_template: String,
  pub letter_voice_template: String,
  pub correct: String,
  pub wrong: String,
  pub score_template: String,
  pub feedback_thanks: String,
  pub abc_song_lyrics: String,
}

impl Default for Messages {
  fn default() -> Self {
    Self {
      character_voice_template: "请找出\"{symbol}\"字".into(),
      letter_voice_template: "Find the letter {symbol}".into(),
      correct: "真棒！答对了！".into(),
      wrong: "再试试看！".into(),
      score_template: "太棒了，{nickname}！你排在第{rank}名！".into(),
      feedback_thanks: "反馈已提交，感谢您的建议！".into(),
      abc_song_lyrics: "A B C D E F G\nH I J K L M N O P\nQ R S T U V\nW X Y and Z\nNow I know my ABCs\nNext time won't you sing with me?".into(),
    }
  }
}

impl GameConfig {
  /// File config (GAME_CONFIG_PATH) or defaults, then env overrides.
  pub fn load() -> Self {
    let mut cfg = load_game_config_from_env().unwrap_or_default();
    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
      cfg.port = port;
    }
    if let Ok(url) = std::env::var("DATABASE_URL") {
      if !url.trim().is_empty() {
        cfg.database_url = url;
      }
    }
    cfg
  }
}

/// Attempt to load `GameConfig` from GAME_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_game_config_from_env() -> Option<GameConfig> {
  let path = std::env::var("GAME_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<GameConfig>(&s) {
      Ok(cfg) => {
        info!(target: "hanzi_island", %path, "Loaded game config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "hanzi_island", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "hanzi_island", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_keeps_defaults() {
    let cfg: GameConfig = toml::from_str(
      r#"
        session_size = 5
        [messages]
        correct = "Great!"
      "#,
    )
    .expect("parse");
    assert_eq!(cfg.session_size, 5);
    assert_eq!(cfg.messages.correct, "Great!");
    assert_eq!(cfg.messages.wrong, "再试试看！");
    assert_eq!(cfg.leaderboard_default_limit, 20);
  }
}
