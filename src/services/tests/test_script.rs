use mockito::Matcher;

use super::{gemini_body, test_config};
use crate::errors::AppError;
use crate::services::script::ScriptGenerator;

const GENERATE_PATH: &str = "/v1beta/models/test-model:generateContent";

#[tokio::test]
async fn test_generate_script_saves_trimmed_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_header("x-goog-api-key", "gm-key")
        .match_body(Matcher::Json(serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{
                    "text": "Write a short 20-word YouTube narration script about volcanoes. No markdown."
                }]
            }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body("\n  Volcanoes reshape our planet, building islands from fire.  \n"))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.url(), dir.path());
    let script_path = config.script_path();

    let script = ScriptGenerator::new(&config)
        .generate_script("volcanoes", &script_path)
        .await
        .unwrap();

    assert_eq!(script, "Volcanoes reshape our planet, building islands from fire.");
    assert_eq!(std::fs::read_to_string(&script_path).unwrap(), script);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_script_is_an_error_and_not_saved() {
    let mut server = mockito::Server::new_async().await;
    let _generate = server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_body(gemini_body("   "))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.url(), dir.path());
    let script_path = config.script_path();

    let result = ScriptGenerator::new(&config)
        .generate_script("volcanoes", &script_path)
        .await;

    assert!(matches!(result, Err(AppError::EmptyScript)));
    assert!(!script_path.exists());
}

#[tokio::test]
async fn test_api_error_message_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _generate = server
        .mock("POST", GENERATE_PATH)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.url(), dir.path());

    let err = ScriptGenerator::new(&config)
        .generate_script("volcanoes", &config.script_path())
        .await
        .unwrap_err();

    match err {
        AppError::ScriptGeneration(msg) => {
            assert!(msg.contains("API key not valid."));
            assert!(msg.contains("INVALID_ARGUMENT"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
