use interior_stager::{
    backend::HttpBackend,
    models::{Config, GenerationRequest, RoomMode},
    rate::RateState,
    session::Studio,
    Error,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PHOTO: &str = "data:image/png;base64,iVBORw0KGgo=";

fn config_for(server: &MockServer) -> Config {
    Config {
        base_url: server.uri(),
        timeout: Duration::from_millis(500),
        fallback_image_path: "images/sample.jpg".to_string(),
        ..Config::default()
    }
}

fn studio_for(config: Config) -> Studio {
    Studio::new(Box::new(HttpBackend::new(&config)), config)
}

fn request(variations: i64) -> GenerationRequest {
    GenerationRequest::new(PHOTO.to_string(), vec!["sofa".to_string(), "lamp".to_string()])
        .with_mode(RoomMode::Manual)
        .with_room_type("living room")
        .with_variations(variations)
}

async fn mount_generate_failure(server: &MockServer, image_path: &str) {
    Mock::given(method("POST"))
        .and(path("/api/imageMake"))
        .and(body_partial_json(json!({ "imagePath": image_path })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "not found" })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_second_variation_failing_everywhere_still_returns_first() {
    let server = MockServer::start().await;

    // First upload succeeds, every later one is rejected.
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "filename": "room.png" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "png only" })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/imageMake"))
        .and(body_partial_json(json!({ "imagePath": "images/room.png" })))
        .and(body_string_contains("(variation 1)"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "result": "iVBORw0KGgo=", "notPlaced": ["lamp"] })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_generate_failure(&server, "images/sample.jpg").await;
    mount_generate_failure(&server, "images/sample.png").await;

    let mut studio = studio_for(config_for(&server));
    let results = studio.generate(request(2)).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].image.starts_with("data:image/jpeg;base64,"));
    assert_eq!(studio.status().not_placed, vec!["lamp".to_string()]);
    assert_eq!(studio.rate_state().call_count, 1);

    let received = server.received_requests().await.unwrap();
    let generate_calls = received
        .iter()
        .filter(|r| r.url.path() == "/api/imageMake")
        .count();
    assert_eq!(generate_calls, 3);
}

#[tokio::test]
async fn test_binary_image_response_is_resolvable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "filename": "room.png" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/imageMake"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89, 0x50, 0x4E, 0x47], "image/png"))
        .mount(&server)
        .await;

    let mut studio = studio_for(config_for(&server));
    let results = studio.generate(request(1)).await.unwrap();

    assert_eq!(results.len(), 1);
    let payload = studio.resolve_image(&results[0].image).unwrap();
    assert_eq!(payload.mime_type, "image/png");
    assert_eq!(payload.data, vec![0x89, 0x50, 0x4E, 0x47]);
    assert_eq!(studio.status().notice, None);
}

#[tokio::test]
async fn test_inline_fallback_when_backend_does_not_expect_paths() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/imageMake"))
        .and(body_partial_json(json!({ "imageBase64": PHOTO })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": "AAAA", "report": "2 items placed" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        expects_image_path: false,
        ..config_for(&server)
    };
    let mut studio = studio_for(config);
    let results = studio.generate(request(1)).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(studio.status().notice.as_deref(), Some("2 items placed"));
}

#[tokio::test]
async fn test_strict_mode_failure_rolls_back_rate_state() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = Config {
        strict_variations: true,
        ..config_for(&server)
    };
    let before = RateState {
        call_count: 3,
        last_call: Some(chrono::Utc::now()),
    };
    let mut studio = studio_for(config).with_rate_state(before.clone());

    let err = studio.generate(request(1)).await.unwrap_err();

    assert!(matches!(err, Error::AllVariationsFailed { .. }));
    assert_eq!(studio.rate_state().call_count, before.call_count);
    assert_eq!(studio.rate_state().last_call, None);
    assert_eq!(
        studio.status().message.as_deref(),
        Some("The backend hit an internal error. Check the server logs.")
    );
}

#[tokio::test]
async fn test_rate_limit_blocks_sixth_call_within_a_minute() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "filename": "room.png" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/imageMake"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "AAAA" })))
        .expect(5)
        .mount(&server)
        .await;

    let mut studio = studio_for(config_for(&server));
    for _ in 0..5 {
        studio.generate(request(1)).await.unwrap();
    }

    let err = studio.generate(request(1)).await.unwrap_err();
    assert!(matches!(err, Error::RateLimited { .. }));
    assert_eq!(studio.rate_state().call_count, 5);
}
