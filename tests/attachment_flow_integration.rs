mod common;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{controller_for, ndjson_reply};
use olloquy::attachment::AttachmentRecord;
use olloquy::Role;

/// A successful attachment appends the announce, preview, and chunk
/// messages and writes both blobs to the store directory
#[tokio::test]
async fn test_attach_file_writes_messages_and_records() {
    let (mut controller, tmp) = controller_for("http://127.0.0.1:1", 4);

    let source = tmp.path().join("notes.txt");
    std::fs::write(&source, b"ABCDEFGHIJ").unwrap();

    controller.attach_file(&source).unwrap();

    let messages = controller.active_messages();
    assert_eq!(messages.len(), 4);
    assert!(messages[1..].iter().all(|m| m.role == Role::User));
    assert_eq!(
        messages[1].content,
        "I've uploaded a file named 'notes.txt'."
    );
    assert_eq!(
        messages[2].content,
        "Here's a preview of the file:\n\nABCDEFGHIJ"
    );
    assert_eq!(
        messages[3].content,
        "File processed successfully.\nHere are the first chunks:\n\n\
         Chunk 1: ABCD\nChunk 2: EFGH\nChunk 3: IJ"
    );

    let store_dir = tmp.path().join("attachments");
    let raw = std::fs::read(store_dir.join("notes.txt")).unwrap();
    assert_eq!(raw, b"ABCDEFGHIJ");

    let record_bytes = std::fs::read(store_dir.join("notes.txt.json")).unwrap();
    let record: AttachmentRecord = serde_json::from_slice(&record_bytes).unwrap();
    assert_eq!(record.file_name, "notes.txt");
    assert_eq!(record.chunks, vec!["ABCD", "EFGH", "IJ"]);
}

/// A missing file is reported in the conversation and leaves the session
/// usable
#[tokio::test]
async fn test_attach_missing_file_logs_failure() {
    let (mut controller, tmp) = controller_for("http://127.0.0.1:1", 4);

    controller
        .attach_file(&tmp.path().join("missing.txt"))
        .unwrap();

    let messages = controller.active_messages().to_vec();
    assert_eq!(messages.len(), 3);
    assert_eq!(
        messages[1].content,
        "I've uploaded a file named 'missing.txt'."
    );
    assert!(messages[2].content.starts_with("Couldn't read the file:"));

    // Nothing was written for the failed upload
    assert!(!tmp.path().join("attachments").join("missing.txt").exists());

    // The same conversation accepts a real attachment afterwards
    let source = tmp.path().join("real.txt");
    std::fs::write(&source, b"content").unwrap();
    controller.attach_file(&source).unwrap();
    assert_eq!(controller.active_messages().len(), 6);
}

/// Attachment messages become part of the context sent with later prompts
#[tokio::test]
async fn test_attached_context_reaches_backend() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(ndjson_reply(&["Noted."]), "application/x-ndjson"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (mut controller, tmp) = controller_for(&server.uri(), 4);

    let source = tmp.path().join("notes.txt");
    std::fs::write(&source, b"ABCDEFGHIJ").unwrap();
    controller.attach_file(&source).unwrap();

    controller
        .submit_prompt("What does the file say?", |_| {})
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();

    // Greeting, three attachment messages, and the prompt
    assert_eq!(messages.len(), 5);
    assert_eq!(
        messages[1]["content"],
        "I've uploaded a file named 'notes.txt'."
    );
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[4]["content"], "What does the file say?");

    // The reply landed after the attachment exchange
    let transcript = controller.active_messages();
    assert_eq!(transcript.len(), 6);
    assert_eq!(transcript[5].content, "Noted.");
}
