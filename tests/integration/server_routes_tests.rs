/*!
 * HTTP route tests over an in-memory store and a mocked provider
 */

use std::time::Duration;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestServer, TestWebSocket, WsMessage};
use doctran::database::models::{GlossaryPage, TranslationRecord};
use doctran::providers::mock::{MockDelay, MockProvider};
use doctran::server::router;
use doctran::translation::BatchEvent;
use serde_json::{json, Value};

use crate::common::{build_docx, mock_state};

const SOCKET_PATH: &str = "/api/doc_translate/ws/translate";

fn test_server(mock: MockProvider) -> TestServer {
    TestServer::new(router(mock_state(mock).unwrap())).unwrap()
}

/// WebSockets need a real HTTP transport
fn socket_server(mock: MockProvider) -> TestServer {
    TestServer::builder()
        .http_transport()
        .build(router(mock_state(mock).unwrap()))
        .unwrap()
}

async fn open_socket(server: &TestServer) -> TestWebSocket {
    server.get_websocket(SOCKET_PATH).await.into_websocket().await
}

#[tokio::test]
async fn test_translate_withoutEnhance_shouldReturnPlainTranslation() {
    let server = test_server(MockProvider::working());

    let response = server
        .post("/api/translate")
        .json(&json!({ "text": "Hello", "lang": "English", "targetLang": "fr" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["translation"], "[TRANSLATED] Hello");
    assert_eq!(body["targetLang"], "fr");
    assert!(body.get("optimized").is_none());
}

#[tokio::test]
async fn test_translate_withEnhance_shouldReturnBothStages() {
    let server = test_server(MockProvider::working());

    let response = server
        .post("/api/translate")
        .json(&json!({ "text": "Hello", "enhance": true }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["initial"], "[TRANSLATED] Hello");
    assert!(body["optimized"].as_str().unwrap().starts_with("[TRANSLATED] Original: Hello"));
    assert_eq!(body["targetLang"], "中文");
}

#[tokio::test]
async fn test_translate_withProviderFailure_shouldReturn500() {
    let server = test_server(MockProvider::failing());

    let response = server
        .post("/api/translate")
        .json(&json!({ "text": "Hello" }))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert!(body["detail"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_glossary_crud_shouldFollowStoreRules() {
    let server = test_server(MockProvider::working());

    server
        .post("/api/glossary/add")
        .json(&json!({ "term": "Neural Network", "translation": "神经网络" }))
        .await
        .assert_status_ok();

    let duplicate = server
        .post("/api/glossary/add")
        .json(&json!({ "term": "neural network", "translation": "other" }))
        .await;
    assert_eq!(duplicate.status_code(), 400);

    server
        .post("/api/glossary/update")
        .json(&json!({ "term": "NEURAL NETWORK", "translation": "神经网路" }))
        .await
        .assert_status_ok();

    let page: GlossaryPage = server.get("/api/glossary/all").await.json();
    assert_eq!(page.total, 1);
    assert_eq!(page.page, 1);
    assert_eq!(page.per_page, 50);
    assert_eq!(page.terms[0].term, "neural network");
    assert_eq!(page.terms[0].translation, "神经网路");

    server
        .post("/api/glossary/delete")
        .json(&json!({ "term": "Neural Network" }))
        .await
        .assert_status_ok();

    let missing = server
        .post("/api/glossary/delete")
        .json(&json!({ "term": "Neural Network" }))
        .await;
    assert_eq!(missing.status_code(), 404);
}

#[tokio::test]
async fn test_glossaryAll_withPaging_shouldSliceNewestFirst() {
    let server = test_server(MockProvider::working());
    for term in ["alpha", "beta", "gamma"] {
        server
            .post("/api/glossary/add")
            .json(&json!({ "term": term, "translation": term.to_uppercase() }))
            .await
            .assert_status_ok();
    }

    let page: GlossaryPage = server
        .get("/api/glossary/all")
        .add_query_param("page", 2)
        .add_query_param("per_page", 2)
        .await
        .json();

    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.terms.len(), 1);
    assert_eq!(page.terms[0].term, "alpha");
}

#[tokio::test]
async fn test_glossaryAll_withOversizedPage_shouldReject() {
    let server = test_server(MockProvider::working());

    let response = server
        .get("/api/glossary/all")
        .add_query_param("per_page", 500)
        .await;

    assert_eq!(response.status_code(), 422);
}

#[tokio::test]
async fn test_translationHistory_shouldSaveListAndDelete() {
    let server = test_server(MockProvider::working());

    for text in ["first", "second"] {
        let response = server
            .post("/api/translation")
            .json(&json!({
                "text": text,
                "translation": format!("{} (fr)", text),
                "lang": "English",
                "targetLang": "fr"
            }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "success");
    }

    let body: Value = server.get("/api/translation/history").await.json();
    let records: Vec<TranslationRecord> =
        serde_json::from_value(body["translations"].clone()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].original_text, "second");
    assert_eq!(records[0].target_language, "fr");

    let deleted = server
        .delete(&format!("/api/translation/{}", records[0].id))
        .await;
    assert_eq!(deleted.status_code(), 204);

    let missing = server
        .delete(&format!("/api/translation/{}", records[0].id))
        .await;
    assert_eq!(missing.status_code(), 404);

    let body: Value = server.get("/api/translation/history").await.json();
    assert_eq!(body["translations"].as_array().unwrap().len(), 1);
}

fn terms_reply(request: &doctran::providers::CompletionRequest) -> String {
    if request.user_content.contains("GPU") {
        r#"{"terms":["GPU","CUDA"]}"#.to_string()
    } else {
        r#"{"terms":["gpu","tensor"]}"#.to_string()
    }
}

#[tokio::test]
async fn test_termExtract_withDocx_shouldMergeAndCount() {
    let server = test_server(MockProvider::working().with_custom_response(terms_reply));
    let docx = build_docx(&["The GPU runs CUDA kernels.", "Each tensor lives on the gpu."]).unwrap();

    let response = server
        .post("/api/term_extract/term_extract_batch")
        .multipart(
            MultipartForm::new()
                .add_part(
                    "file",
                    Part::bytes(docx)
                        .file_name("paper.docx")
                        .mime_type("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
                )
                .add_text("extraction_provider", "qwen"),
        )
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body["terms"],
        json!([
            { "term": "GPU", "count": 2 },
            { "term": "CUDA", "count": 1 },
            { "term": "tensor", "count": 1 }
        ])
    );
}

#[tokio::test]
async fn test_termExtract_withoutFile_shouldReturn400() {
    let server = test_server(MockProvider::working());

    let response = server
        .post("/api/term_extract/term_extract_batch")
        .multipart(MultipartForm::new().add_text("extraction_provider", "deepseek"))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_termExtract_withNonJsonReply_shouldReturn500() {
    let server = test_server(MockProvider::working());

    let response = server
        .post("/api/term_extract/term_extract_batch")
        .multipart(
            MultipartForm::new()
                .add_part("file", Part::bytes(b"Plain text paragraph".to_vec()).file_name("a.txt"))
                .add_text("extraction_provider", "deepseek"),
        )
        .await;

    assert_eq!(response.status_code(), 500);
}

#[tokio::test]
async fn test_socket_withDocument_shouldStreamProgressThenDone() {
    let server = socket_server(MockProvider::working());
    let mut socket = open_socket(&server).await;

    socket
        .send_json(&json!({ "target_lang": "French", "enhance": false }))
        .await;
    let docx = build_docx(&["One", "Two", "Three"]).unwrap();
    socket.send_message(WsMessage::Binary(docx.into())).await;

    let mut currents = Vec::new();
    for _ in 0..3 {
        match socket.receive_json::<BatchEvent>().await {
            BatchEvent::Progress { current, total, .. } => {
                assert_eq!(total, 3);
                currents.push(current);
            }
            other => panic!("expected progress, got {:?}", other),
        }
    }
    assert_eq!(currents, vec![1, 2, 3]);

    match socket.receive_json::<BatchEvent>().await {
        BatchEvent::Done { total, results } => {
            assert_eq!(total, 3);
            let originals: Vec<_> = results.iter().map(|u| u.original.as_str()).collect();
            assert_eq!(originals, vec!["One", "Two", "Three"]);
            assert_eq!(results[1].initial, "[TRANSLATED] Two");
        }
        other => panic!("expected done, got {:?}", other),
    }
}

#[tokio::test]
async fn test_socket_withUnreadableDocument_shouldSendSingleErrorEvent() {
    let mock = MockProvider::working();
    let server = socket_server(mock.clone());
    let mut socket = open_socket(&server).await;

    socket.send_json(&json!({ "target_lang": "French" })).await;
    socket
        .send_message(WsMessage::Binary(b"PK\x03\x04garbage".to_vec().into()))
        .await;

    match socket.receive_json::<BatchEvent>().await {
        BatchEvent::Error { message } => assert!(message.starts_with("Invalid document")),
        other => panic!("expected error, got {:?}", other),
    }
    assert!(matches!(socket.receive_message().await, WsMessage::Close(_)));
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_socket_withDocumentBeforeConfig_shouldRejectFrameType() {
    let server = socket_server(MockProvider::working());
    let mut socket = open_socket(&server).await;

    let docx = build_docx(&["One"]).unwrap();
    socket.send_message(WsMessage::Binary(docx.into())).await;

    assert_eq!(
        socket.receive_json::<BatchEvent>().await,
        BatchEvent::error("Expected a JSON configuration text frame")
    );
}

#[tokio::test]
async fn test_socket_withTextDocumentFrame_shouldRejectFrameType() {
    let server = socket_server(MockProvider::working());
    let mut socket = open_socket(&server).await;

    socket.send_json(&json!({ "target_lang": "French" })).await;
    socket.send_text("not a binary frame").await;

    assert_eq!(
        socket.receive_json::<BatchEvent>().await,
        BatchEvent::error("Expected the document as a binary frame")
    );
}

#[tokio::test]
async fn test_socket_withClientDisconnect_shouldCancelBatch() {
    let mock = MockProvider::working().with_delay(MockDelay::Fixed(100));
    let server = socket_server(mock.clone());
    let mut socket = open_socket(&server).await;

    let texts: Vec<String> = (0..80).map(|i| format!("Paragraph {}", i)).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    socket.send_json(&json!({ "target_lang": "French" })).await;
    socket
        .send_message(WsMessage::Binary(build_docx(&refs).unwrap().into()))
        .await;

    let first = socket.receive_json::<BatchEvent>().await;
    assert!(matches!(first, BatchEvent::Progress { total: 80, .. }));
    socket.close().await;

    // An uncancelled batch would have started all 80 calls well within this window
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let started = mock.request_count();
    assert!(started < 80, "batch kept running after disconnect: {} calls", started);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(mock.request_count(), started);
}
