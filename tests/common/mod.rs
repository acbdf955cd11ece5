use tempfile::TempDir;

use olloquy::config::OllamaConfig;
use olloquy::{AttachmentStore, ChatController, OllamaClient};

/// Build a controller whose client points at `host`, with attachments
/// stored under a fresh tempdir.
#[allow(dead_code)]
pub fn controller_for(host: &str, chunk_size: usize) -> (ChatController, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let ollama = OllamaConfig {
        host: host.to_string(),
        ..OllamaConfig::default()
    };
    let client = OllamaClient::new(ollama).expect("failed to build client");
    let store = AttachmentStore::with_chunk_size(tmp.path().join("attachments"), chunk_size);
    (ChatController::new(client, store), tmp)
}

/// Build an NDJSON chat body from token fragments, closed by the done marker
#[allow(dead_code)]
pub fn ndjson_reply(tokens: &[&str]) -> String {
    let mut lines = delta_lines(tokens);
    lines.push(
        serde_json::json!({
            "message": {"role": "assistant", "content": ""},
            "done": true,
            "done_reason": "stop"
        })
        .to_string(),
    );
    lines.join("\n") + "\n"
}

/// Build an NDJSON chat body that ends without the done marker
#[allow(dead_code)]
pub fn ndjson_partial(tokens: &[&str]) -> String {
    delta_lines(tokens).join("\n") + "\n"
}

#[allow(dead_code)]
fn delta_lines(tokens: &[&str]) -> Vec<String> {
    tokens
        .iter()
        .map(|token| {
            serde_json::json!({
                "message": {"role": "assistant", "content": token},
                "done": false
            })
            .to_string()
        })
        .collect()
}
