use super::{AppState, create_router};
use crate::config::{Config, DeemixConfig, PipelineConfig, ServerConfig};
use crate::pipeline::test_helpers::{MockDeemix, MockFetcher, deezer_track, test_pipeline};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_config() -> Arc<Config> {
    Arc::new(Config {
        server: ServerConfig {
            port: 0,
            dev_mode: false,
        },
        deemix: DeemixConfig {
            base_url: "http://localhost:6595".into(),
            arl: "test-arl".into(),
        },
        navidrome: None,
        pipeline: PipelineConfig::default(),
    })
}

/// Router over a scenario-A style playlist: two matched tracks, one miss.
fn test_app() -> (Router, Arc<MockDeemix>) {
    let fetcher = Arc::new(MockFetcher::with_entries(&[
        "Arctic Monkeys - Do I Wanna Know?",
        "Unknown Song Title",
        "Radiohead - Creep",
    ]));
    let deemix = Arc::new(MockDeemix::new());
    deemix.set_results(
        "Arctic Monkeys Do I Wanna Know?",
        vec![deezer_track(1, "Arctic Monkeys", "Do I Wanna Know?")],
    );
    deemix.set_results("Radiohead Creep", vec![deezer_track(2, "Radiohead", "Creep")]);

    let pipeline = test_pipeline(fetcher.clone(), deemix.clone(), None);
    let state = AppState::new(pipeline, fetcher, test_config());
    (create_router(state), deemix)
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Start an analysis and poll until the session reports `ready`.
async fn analyze_until_ready(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/analyze",
            serde_json::json!({"url": "https://www.youtube.com/playlist?list=PL1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let session_id = body["session_id"].as_str().unwrap().to_string();
    assert_eq!(session_id.len(), 16);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/session/{session_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        match body["status"].as_str().unwrap() {
            "ready" => return session_id,
            "error" | "canceled" => panic!("session failed: {body}"),
            _ => {}
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "session never became ready"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn analyze_requires_a_url() {
    let (app, _) = test_app();
    let response = app
        .oneshot(post_json("/api/analyze", serde_json::json!({"url": ""})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn analyze_rejects_non_youtube_urls() {
    let (app, _) = test_app();
    let response = app
        .oneshot(post_json(
            "/api/analyze",
            serde_json::json!({"url": "https://vimeo.com/12345"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "invalid YouTube URL");
}

#[tokio::test]
async fn analyze_and_poll_returns_the_full_snapshot() {
    let (app, _) = test_app();
    let session_id = analyze_until_ready(&app).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/session/{session_id}")))
        .await
        .unwrap();
    let body = body_json(response).await;

    assert_eq!(body["id"], session_id.as_str());
    assert_eq!(body["status"], "ready");
    assert_eq!(body["progress"]["total"], 3);
    assert_eq!(body["progress"]["searched"], 3);
    assert_eq!(body["progress"]["selected"], 2);
    assert_eq!(body["progress"]["not_found"], 1);
    assert_eq!(body["tracks"][0]["status"], "found");
    assert_eq!(body["tracks"][0]["selected"], true);
    assert_eq!(body["tracks"][1]["status"], "not_found");
    assert_eq!(
        body["tracks"][0]["deezer_match"]["link"],
        "https://www.deezer.com/track/1"
    );
    // A zero bitrate in the request defaults to the 128 kbps code.
    assert_eq!(body["bitrate"], 1);
}

#[tokio::test]
async fn get_session_returns_404_for_unknown_id() {
    let (app, _) = test_app();
    let response = app
        .oneshot(get("/api/session/ffffffffffffffff"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "session_not_found");
}

#[tokio::test]
async fn download_runs_the_selected_tracks() {
    let (app, deemix) = test_app();
    let session_id = analyze_until_ready(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/session/{session_id}/download"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "downloading");

    // Poll until done, then verify the queue calls.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/session/{session_id}")))
            .await
            .unwrap();
        let body = body_json(response).await;
        if body["status"] == "done" {
            assert_eq!(body["progress"]["queued"], 2);
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "download never finished"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(
        deemix.queued_links(),
        vec![
            "https://www.deezer.com/track/1",
            "https://www.deezer.com/track/2",
        ]
    );
}

#[tokio::test]
async fn download_conflicts_are_400() {
    let (app, _) = test_app();
    let session_id = analyze_until_ready(&app).await;

    // First download is accepted, an immediate second one conflicts.
    let first = app
        .clone()
        .oneshot(post_json(
            &format!("/api/session/{session_id}/download"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .clone()
        .oneshot(post_json(
            &format!("/api/session/{session_id}/download"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body = body_json(second).await;
    assert_eq!(body["error"]["code"], "session_not_ready");
}

#[tokio::test]
async fn pause_conflicts_and_unknown_sessions_map_to_400_and_404() {
    let (app, _) = test_app();
    let session_id = analyze_until_ready(&app).await;

    // Pausing a ready session is a state conflict.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/session/{session_id}/pause"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "session_not_active");

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/session/ffffffffffffffff/pause",
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_then_cancel_again_is_a_conflict() {
    let (app, _) = test_app();
    let session_id = analyze_until_ready(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/session/{session_id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "canceled");

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/session/{session_id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "session_terminal");
}

#[tokio::test]
async fn select_track_round_trips_the_new_state() {
    let (app, _) = test_app();
    let session_id = analyze_until_ready(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/session/{session_id}/track/0/select"),
            serde_json::json!({"selected": false}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["selected"], false);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/session/{session_id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["tracks"][0]["selected"], false);
    assert_eq!(body["progress"]["selected"], 1);
}

#[tokio::test]
async fn select_track_out_of_range_is_404() {
    let (app, _) = test_app();
    let session_id = analyze_until_ready(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/session/{session_id}/track/99/select"),
            serde_json::json!({"selected": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "track_out_of_range");
}

#[tokio::test]
async fn search_track_requires_a_query() {
    let (app, _) = test_app();
    let session_id = analyze_until_ready(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/session/{session_id}/track/1/search"),
            serde_json::json!({"query": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_track_returns_the_new_match_and_confidence() {
    let (app, deemix) = test_app();
    let session_id = analyze_until_ready(&app).await;

    // Re-search the third track; the parsed artist "Radiohead" is
    // prepended to the user-edited query.
    deemix.set_results(
        "Radiohead Creep Acoustic",
        vec![deezer_track(5, "Radiohead", "Creep (Acoustic)")],
    );

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/session/{session_id}/track/2/search"),
            serde_json::json!({"query": "Creep Acoustic"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["deezer_match"]["id"], 5);
    assert_eq!(body["deezer_match"]["link"], "https://www.deezer.com/track/5");
    assert_eq!(body["deezer_match"]["artist"], "Radiohead");
    let confidence = body["confidence"].as_u64().unwrap();
    assert!(
        confidence > 0 && confidence < 100,
        "decorated title scores between the extremes, got {confidence}"
    );
}

#[tokio::test]
async fn channel_playlists_validates_the_url() {
    let (app, _) = test_app();

    let response = app
        .clone()
        .oneshot(get("/api/channel/playlists"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/api/channel/playlists?url=https://youtu.be/abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get(
            "/api/channel/playlists?url=https://www.youtube.com/@artist",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["playlists"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn url_info_returns_url_and_title() {
    let (app, _) = test_app();

    let response = app
        .clone()
        .oneshot(get("/api/url/info?url=https://youtu.be/abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["url"], "https://youtu.be/abc");
    assert!(body["title"].is_string());
}

#[tokio::test]
async fn navidrome_status_reports_unconfigured() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/api/navidrome/status")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["configured"], false);
    assert_eq!(body["skip_default"], false);
}

#[tokio::test]
async fn stats_reports_session_count() {
    let (app, _) = test_app();
    let _session_id = analyze_until_ready(&app).await;

    let response = app.oneshot(get("/api/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["sessions"], 1);
    assert!(body["uptime_sec"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/api/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["info"]["title"], "deemix-sync API");
    assert!(body["paths"]["/api/analyze"].is_object());
}
