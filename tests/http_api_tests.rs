// Integration tests for the HTTP surface
//
// The router is exercised in-process with tower's oneshot; the
// recommendation backend is a scripted double, so these tests cover the
// camelCase boundary contract without any network.

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use reel_chat::config::TranscriptionConfig;
use reel_chat::{
    AppState, ChatError, NewChatReply, RecommendReply, Recommender, TranscriptionClient, WireTurn,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tower::ServiceExt;

struct FakeRecommender {
    sessions_created: AtomicU32,
    /// When present, `recommend` blocks until a permit is added
    gate: Option<Arc<Semaphore>>,
}

impl FakeRecommender {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions_created: AtomicU32::new(0),
            gate: None,
        })
    }

    fn gated(gate: Arc<Semaphore>) -> Arc<Self> {
        Arc::new(Self {
            sessions_created: AtomicU32::new(0),
            gate: Some(gate),
        })
    }
}

#[async_trait]
impl Recommender for FakeRecommender {
    async fn new_chat(&self) -> Result<NewChatReply, ChatError> {
        let n = self.sessions_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(NewChatReply {
            session_id: format!("session-{}", n),
            message: "Hi! What are you in the mood to watch?".to_string(),
        })
    }

    async fn recommend(
        &self,
        text: &str,
        _session_id: &str,
        _history: &[WireTurn],
    ) -> Result<RecommendReply, ChatError> {
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| ChatError::BackendUnavailable)?;
            permit.forget();
        }
        Ok(RecommendReply {
            single_recommendation: Some("Hot Fuzz (2007) - action comedy done right".to_string()),
            ten_recommendations: Some(
                "Hot Fuzz, Die Hard, Deadpool, Kingsman, Rush Hour, Baby Driver, \
                 The Nice Guys, 21 Jump Street, Tropic Thunder, Kick-Ass"
                    .to_string(),
            ),
            conversation_count: 1,
            ai_response: format!("Great picks for: {}", text),
            is_asking_question: false,
            conversation_complete: true,
            user_preferences: HashMap::from([("genre".to_string(), "action".to_string())]),
        })
    }
}

fn transcription_config(max_upload_bytes: usize) -> TranscriptionConfig {
    TranscriptionConfig {
        base_url: "http://localhost:9".to_string(),
        api_key: "test-key".to_string(),
        model: "whisper-1".to_string(),
        language: "en".to_string(),
        max_upload_bytes,
        max_attempts: 3,
        initial_backoff_ms: 1,
        request_timeout_secs: 1,
    }
}

fn test_router(max_upload_bytes: usize) -> axum::Router {
    test_router_with(FakeRecommender::new(), max_upload_bytes)
}

fn test_router_with(recommender: Arc<FakeRecommender>, max_upload_bytes: usize) -> axum::Router {
    let transcriber =
        Arc::new(TranscriptionClient::new(transcription_config(max_upload_bytes)).unwrap());
    let state = AppState::new(recommender, transcriber);
    reel_chat::create_router(state)
}

async fn json_body(response: axum::response::Response) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_upload(field_name: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "reel-chat-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"clip.webm\"\r\n\
             Content-Type: audio/webm\r\n\r\n",
            field_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/transcribe")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn new_chat_then_recommendation_round() -> Result<()> {
    let router = test_router(1024 * 1024);

    // Start a conversation
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/new-chat")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    let session_id = body["sessionId"].as_str().unwrap().to_string();
    assert!(body["message"].as_str().unwrap().contains("mood"));

    // One recommendation round-trip
    let response = router
        .clone()
        .oneshot(post_json(
            "/movie-recommendation",
            serde_json::json!({"text": "I want a funny action movie", "sessionId": session_id}),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    assert_eq!(body["sessionId"], Value::String(session_id.clone()));
    assert_eq!(body["conversationComplete"], Value::Bool(true));
    assert_eq!(body["isAskingQuestion"], Value::Bool(false));
    assert_eq!(body["userPreferences"]["genre"], "action");
    let titles = body["tenRecommendations"].as_str().unwrap();
    assert_eq!(titles.split(',').count(), 10);

    // History shows greeting + user + AI, camelCase on the wire
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/sessions/{}/history", session_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let history = json_body(response).await?;
    let turns = history.as_array().unwrap();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[0]["isUser"], Value::Bool(false));
    assert_eq!(turns[1]["isUser"], Value::Bool(true));
    assert_eq!(turns[1]["text"], "I want a funny action movie");
    assert_eq!(turns[2]["isUser"], Value::Bool(false));

    Ok(())
}

#[tokio::test]
async fn health_reports_active_sessions() -> Result<()> {
    let router = test_router(1024);

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["activeSessions"], 0);

    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/new-chat")
                .body(Body::empty())?,
        )
        .await?;

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    let body = json_body(response).await?;
    assert_eq!(body["activeSessions"], 1);

    Ok(())
}

#[tokio::test]
async fn recommendation_for_unknown_session_is_404() -> Result<()> {
    let router = test_router(1024);

    let response = router
        .oneshot(post_json(
            "/movie-recommendation",
            serde_json::json!({"text": "anything", "sessionId": "no-such-session"}),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await?;
    assert!(body["error"].as_str().unwrap().contains("not found"));

    Ok(())
}

#[tokio::test]
async fn empty_text_is_rejected_with_400() -> Result<()> {
    let router = test_router(1024);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/new-chat")
                .body(Body::empty())?,
        )
        .await?;
    let session_id = json_body(response).await?["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    let response = router
        .oneshot(post_json(
            "/movie-recommendation",
            serde_json::json!({"text": "   ", "sessionId": session_id}),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn reset_replaces_the_session_id() -> Result<()> {
    let router = test_router(1024);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/new-chat")
                .body(Body::empty())?,
        )
        .await?;
    let old_id = json_body(response).await?["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/sessions/{}/reset", old_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let new_id = json_body(response).await?["sessionId"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(new_id, old_id);

    // The old id is gone, the new one resolves
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/sessions/{}/history", old_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/sessions/{}/history", new_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await?.as_array().unwrap().len(), 1);

    Ok(())
}

#[tokio::test]
async fn upload_without_audio_field_is_400() -> Result<()> {
    let router = test_router(1024 * 1024);

    let response = router
        .oneshot(multipart_upload("not-audio", b"some bytes"))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await?;
    assert!(body["error"].as_str().unwrap().contains("No audio file"));

    Ok(())
}

#[tokio::test]
async fn upload_above_the_old_default_body_cap_reaches_the_size_check() -> Result<()> {
    // A 3 MB clip under the 25 MiB cap must pass the multipart extractor.
    // The provider endpoint is unroutable, so getting the retried-provider
    // failure (502) proves the request cleared body limit and validation.
    let router = test_router(25 * 1024 * 1024);

    let response = router
        .oneshot(multipart_upload("audio", &vec![0u8; 3 * 1024 * 1024]))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await?;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("attempts"), "unexpected error: {}", error);

    Ok(())
}

#[tokio::test]
async fn submit_racing_reset_returns_conflict_and_spares_the_fresh_session() -> Result<()> {
    let gate = Arc::new(Semaphore::new(0));
    let router = test_router_with(FakeRecommender::gated(Arc::clone(&gate)), 1024);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/new-chat")
                .body(Body::empty())?,
        )
        .await?;
    let old_id = json_body(response).await?["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    // Kick off a round that blocks at the gated backend
    let in_flight = {
        let router = router.clone();
        let old_id = old_id.clone();
        tokio::spawn(async move {
            router
                .oneshot(post_json(
                    "/movie-recommendation",
                    serde_json::json!({"text": "a western", "sessionId": old_id}),
                ))
                .await
        })
    };

    // Wait until the user turn is in history, i.e. the round is in flight
    loop {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/sessions/{}/history", old_id))
                    .body(Body::empty())?,
            )
            .await?;
        if json_body(response).await?.as_array().unwrap().len() == 2 {
            break;
        }
        tokio::task::yield_now().await;
    }

    // Reset supersedes the outstanding round
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/sessions/{}/reset", old_id))
                .body(Body::empty())?,
        )
        .await?;
    let new_id = json_body(response).await?["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    // Let the stale round land: the caller gets a deliberate conflict
    gate.add_permits(1);
    let response = in_flight.await??;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await?;
    assert!(body["error"].as_str().unwrap().contains("superseded"));

    // And the stale payload never reached the fresh session
    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/sessions/{}/history", new_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(json_body(response).await?.as_array().unwrap().len(), 1);

    Ok(())
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_any_network_call() -> Result<()> {
    // 1 KiB cap; the provider URL is unroutable, so a 400 here proves the
    // check fired locally
    let router = test_router(1024);

    let response = router
        .oneshot(multipart_upload("audio", &vec![0u8; 4096]))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await?;
    assert!(body["error"].as_str().unwrap().contains("too large"));

    Ok(())
}
