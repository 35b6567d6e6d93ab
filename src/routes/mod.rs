//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod extract;
pub mod http;

/// Build the application router with:
/// - JSON API under `/api/...` (character game, letter game, leaderboard, feedback)
/// - Static front-end from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/api/health", get(http::http_health))
        // Character game
        .route("/api/characters", get(http::http_get_characters))
        .route("/api/characters/:category", get(http::http_get_category))
        .route("/api/categories", get(http::http_get_categories))
        .route("/api/question", get(http::http_get_question))
        .route("/api/question/:category", get(http::http_get_question_in_category))
        .route("/api/game/start", get(http::http_start_game))
        .route("/api/game/submit", post(http::http_post_answer))
        // Letter game
        .route("/api/english/letters", get(http::http_get_letters))
        .route("/api/english/question", get(http::http_get_letter_question))
        .route("/api/english/game/start", post(http::http_start_letter_game))
        .route("/api/english/game/submit", post(http::http_post_answer))
        .route("/api/english/abc-song", get(http::http_get_abc_song))
        // Leaderboard & feedback
        .route("/api/score", post(http::http_post_score))
        .route("/api/leaderboard", get(http::http_get_leaderboard))
        .route("/api/feedback", post(http::http_post_feedback).get(http::http_get_feedback))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::state::test_state;

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).expect("request")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn app() -> Router {
        build_router(Arc::new(test_state().await))
    }

    #[tokio::test]
    async fn categories_and_unknown_category() {
        let app = app().await;
        let (status, body) = call(&app, get_req("/api/categories")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["自然", "身体"]));

        let (status, body) = call(&app, get_req("/api/characters/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Category not found");
    }

    #[tokio::test]
    async fn question_with_unknown_category_still_answers() {
        let app = app().await;
        let (status, body) = call(&app, get_req("/api/question/nope?difficulty=medium")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["options"].as_array().map(Vec::len), Some(3));
        assert!(body["id"].is_string());
    }

    #[tokio::test]
    async fn session_then_server_judged_answer() {
        let app = app().await;
        let (status, body) = call(&app, get_req("/api/game/start?difficulty=easy&recent=%E6%97%A5,%E6%9C%88")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalQuestions"], 10);
        let first = &body["questions"][0];
        assert_eq!(first["options"].as_array().map(Vec::len), Some(2));
        assert_ne!(first["correctAnswer"], "日");

        let answer = json!({"questionId": first["id"], "answer": first["correctAnswer"], "correctAnswer": "wrong"});
        let (status, verdict) = call(&app, post_json("/api/game/submit", answer)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(verdict["correct"], true);
        assert_eq!(verdict["authority"], "server");
        assert_eq!(verdict["message"], "真棒！答对了！");
    }

    #[tokio::test]
    async fn letter_session_and_abc_song() {
        let app = app().await;
        let (status, body) = call(
            &app,
            post_json("/api/english/game/start", json!({"game_type": "letter_recognition", "difficulty": "hard"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["game_type"], "letter_recognition");
        assert_eq!(body["questions"][0]["options"].as_array().map(Vec::len), Some(4));
        assert!(body["questions"][0]["phonetic"].is_string());

        let (status, song) = call(&app, get_req("/api/english/abc-song")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(song["alphabet"].as_array().map(Vec::len), Some(26));
        assert_eq!(song["alphabet"][0]["letter"], "A");
    }

    #[tokio::test]
    async fn score_validation_and_leaderboard() {
        let app = app().await;
        let (status, body) = call(&app, post_json("/api/score", json!({"nickname": "", "score": 10, "totalTimeMs": 1, "avgTimeMs": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = call(&app, post_json("/api/score", json!({"nickname": "Alex", "score": -1, "totalTimeMs": 1, "avgTimeMs": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            post_json("/api/score", json!({"nickname": "Alex", "score": 100, "totalTimeMs": 5000, "avgTimeMs": 500})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rank"], 1);
        assert_eq!(body["message"], "太棒了，Alex！你排在第1名！");

        let (status, board) = call(&app, get_req("/api/leaderboard?limit=0")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(board["leaderboard"].as_array().map(Vec::len), Some(1));
        assert_eq!(board["leaderboard"][0]["nickname"], "Alex");
        assert_eq!(board["leaderboard"][0]["totalTimeMs"], 5000);
    }

    #[tokio::test]
    async fn feedback_counts_accumulate() {
        let app = app().await;
        let report = json!({"character": "日", "image_file": "日_rì.jpg"});
        call(&app, post_json("/api/feedback", report.clone())).await;
        let (status, body) = call(&app, post_json("/api/feedback", report)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);

        let (status, _) = call(&app, post_json("/api/feedback", json!({"character": "日"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = call(&app, get_req("/api/feedback")).await;
        assert_eq!(list["feedback"].as_array().map(Vec::len), Some(1));
        assert_eq!(list["feedback"][0]["character"], "日");
    }

    #[tokio::test]
    async fn reference_data_uses_file_shape() {
        let app = app().await;
        let (status, body) = call(&app, get_req("/api/characters")).await;
        assert_eq!(status, StatusCode::OK);
        let first = &body["basicChineseCharactersForKids"][0];
        assert_eq!(first["category"], "自然");
        assert_eq!(first["characters"][0]["character"], "日");
        assert_eq!(first["characters"][0]["pinyin"], "rì");
        assert_eq!(first["characters"][0]["image_file"], "日_rì.jpg");

        // 身体
        let (status, body) = call(&app, get_req("/api/characters/%E8%BA%AB%E4%BD%93")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "身体");
        assert_eq!(body["characters"].as_array().map(Vec::len), Some(6));

        let (status, body) = call(&app, get_req("/api/english/letters")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["englishAlphabetForKids"][0]["letters"][0]["letter"].is_string());
    }

    #[tokio::test]
    async fn malformed_input_gets_json_error() {
        let app = app().await;
        let (status, body) = call(
            &app,
            post_json("/api/score", json!({"nickname": 5, "score": 10, "totalTimeMs": 1, "avgTimeMs": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = call(&app, get_req("/api/leaderboard?limit=-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let req = Request::post("/api/game/submit").body(Body::from("not json")).expect("request");
        let (status, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn storage_failure_is_masked() {
        let state = Arc::new(test_state().await);
        state.pool.close().await;
        let app = build_router(state);
        let (status, body) = call(
            &app,
            post_json("/api/score", json!({"nickname": "Alex", "score": 1, "totalTimeMs": 1, "avgTimeMs": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "internal error"}));
    }
}

