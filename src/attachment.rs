//! Attachment ingestion and storage
//!
//! Turns an uploaded file into conversational context: the raw bytes are
//! stored under the attachment directory, the content is decoded as text
//! (best-effort), chunked, and a JSON sidecar record is written next to the
//! raw copy. Records are create-on-upload and never mutated or deleted here;
//! re-uploading the same name overwrites the prior pair of blobs.
//!
//! All operations are synchronous; attachments are small user files and the
//! caller is never inside a stream while ingesting.

use crate::chunker::{chunk_text, DEFAULT_CHUNK_SIZE};
use crate::error::{OlloquyError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Preview length in code points.
pub const PREVIEW_CHARS: usize = 500;

/// Sidecar record persisted as `<dir>/<file_name>.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// Bare name of the uploaded file
    pub file_name: String,
    /// Ordered chunks of the decoded text
    pub chunks: Vec<String>,
}

/// Result of a successful ingestion
#[derive(Debug, Clone)]
pub struct Ingested {
    /// First [`PREVIEW_CHARS`] code points of the decoded text
    pub preview: String,
    /// Ordered chunks of the decoded text
    pub chunks: Vec<String>,
    /// Size of the raw upload in bytes
    pub size_bytes: u64,
}

/// Writes attachment blobs under a fixed directory
///
/// Two blobs per upload: raw bytes at `<dir>/<name>` and the JSON record at
/// `<dir>/<name>.json`, pretty-printed with 4-space indentation.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    dir: PathBuf,
    chunk_size: usize,
}

impl AttachmentStore {
    /// Create a store rooted at `dir` with the default chunk size
    ///
    /// The directory is created on first ingestion, not here.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Create a store rooted at `dir` with an explicit chunk size
    pub fn with_chunk_size(dir: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            dir: dir.into(),
            chunk_size,
        }
    }

    /// The directory attachments are written under
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ingest the file at `path`
    ///
    /// Reads the file once; the same byte buffer feeds both the raw-bytes
    /// write and the text decode. The attachment name is the path's final
    /// component.
    ///
    /// # Errors
    ///
    /// Returns `OlloquyError::Ingest` if the path has no usable file name or
    /// the file cannot be read.
    pub fn ingest_file(&self, path: &Path) -> Result<Ingested> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                OlloquyError::Ingest(format!("No usable file name in {}", path.display()))
            })?;
        let bytes = std::fs::read(path).map_err(|e| {
            OlloquyError::Ingest(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.ingest(file_name, &bytes)
    }

    /// Ingest `bytes` as an attachment named `file_name`
    ///
    /// Decodes lossily (invalid sequences become replacement characters,
    /// never an error), chunks the text, and writes the raw bytes plus the
    /// sidecar record. Overwrites any prior upload with the same name.
    ///
    /// # Arguments
    ///
    /// * `file_name` - Bare attachment name; storage paths derive from it
    /// * `bytes` - The upload's raw content
    ///
    /// # Errors
    ///
    /// Returns `OlloquyError::Ingest` if the storage directory or either blob
    /// cannot be written.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use olloquy::attachment::AttachmentStore;
    ///
    /// let store = AttachmentStore::new("temp_storage");
    /// let ingested = store.ingest("notes.txt", b"hello world")?;
    /// assert_eq!(ingested.preview, "hello world");
    /// # anyhow::Ok(())
    /// ```
    pub fn ingest(&self, file_name: &str, bytes: &[u8]) -> Result<Ingested> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            OlloquyError::Ingest(format!(
                "Failed to create attachment directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let raw_path = self.dir.join(file_name);
        std::fs::write(&raw_path, bytes).map_err(|e| {
            OlloquyError::Ingest(format!("Failed to write {}: {}", raw_path.display(), e))
        })?;

        let text = String::from_utf8_lossy(bytes);
        let preview: String = text.chars().take(PREVIEW_CHARS).collect();
        let record = AttachmentRecord {
            file_name: file_name.to_string(),
            chunks: chunk_text(&text, self.chunk_size),
        };

        let sidecar_path = self.dir.join(format!("{}.json", file_name));
        let sidecar = to_pretty_json(&record)?;
        std::fs::write(&sidecar_path, sidecar).map_err(|e| {
            OlloquyError::Ingest(format!("Failed to write {}: {}", sidecar_path.display(), e))
        })?;

        tracing::info!(
            "Ingested attachment {} ({} bytes, {} chunks)",
            file_name,
            bytes.len(),
            record.chunks.len()
        );

        Ok(Ingested {
            preview,
            chunks: record.chunks,
            size_bytes: bytes.len() as u64,
        })
    }
}

/// Serialize a record with 4-space indentation, matching the sidecar contract
fn to_pretty_json(record: &AttachmentRecord) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    record.serialize(&mut serializer)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store(chunk_size: usize) -> (AttachmentStore, TempDir) {
        let tmp = TempDir::new().expect("failed to create tempdir");
        let store = AttachmentStore::with_chunk_size(tmp.path().join("attachments"), chunk_size);
        (store, tmp)
    }

    #[test]
    fn test_ingest_chunks_and_preview() {
        let (store, _tmp) = temp_store(4);
        let ingested = store.ingest("sample.txt", b"ABCDEFGHIJ").unwrap();
        assert_eq!(ingested.chunks, vec!["ABCD", "EFGH", "IJ"]);
        assert_eq!(ingested.preview, "ABCDEFGHIJ");
        assert_eq!(ingested.size_bytes, 10);
    }

    #[test]
    fn test_ingest_writes_raw_bytes() {
        let (store, _tmp) = temp_store(4);
        store.ingest("sample.txt", b"ABCDEFGHIJ").unwrap();
        let raw = std::fs::read(store.dir().join("sample.txt")).unwrap();
        assert_eq!(raw, b"ABCDEFGHIJ");
    }

    #[test]
    fn test_ingest_writes_sidecar_with_four_space_indent() {
        let (store, _tmp) = temp_store(4);
        store.ingest("sample.txt", b"ABCDEFGHIJ").unwrap();
        let sidecar = std::fs::read_to_string(store.dir().join("sample.txt.json")).unwrap();
        let expected = concat!(
            "{\n",
            "    \"file_name\": \"sample.txt\",\n",
            "    \"chunks\": [\n",
            "        \"ABCD\",\n",
            "        \"EFGH\",\n",
            "        \"IJ\"\n",
            "    ]\n",
            "}"
        );
        assert_eq!(sidecar, expected);
    }

    #[test]
    fn test_ingest_sidecar_round_trips() {
        let (store, _tmp) = temp_store(1000);
        store.ingest("notes.txt", b"hello world").unwrap();
        let sidecar = std::fs::read(store.dir().join("notes.txt.json")).unwrap();
        let record: AttachmentRecord = serde_json::from_slice(&sidecar).unwrap();
        assert_eq!(record.file_name, "notes.txt");
        assert_eq!(record.chunks, vec!["hello world"]);
    }

    #[test]
    fn test_ingest_preview_truncates_at_500_chars() {
        let (store, _tmp) = temp_store(1000);
        let text = "x".repeat(600);
        let ingested = store.ingest("long.txt", text.as_bytes()).unwrap();
        assert_eq!(ingested.preview.chars().count(), PREVIEW_CHARS);
        assert_eq!(ingested.chunks.concat(), text);
    }

    #[test]
    fn test_ingest_empty_file() {
        let (store, _tmp) = temp_store(1000);
        let ingested = store.ingest("empty.txt", b"").unwrap();
        assert_eq!(ingested.preview, "");
        assert!(ingested.chunks.is_empty());
        assert_eq!(ingested.size_bytes, 0);
        assert!(store.dir().join("empty.txt").exists());
        assert!(store.dir().join("empty.txt.json").exists());
    }

    #[test]
    fn test_ingest_invalid_utf8_is_lossy_not_fatal() {
        let (store, _tmp) = temp_store(1000);
        let bytes = [0xff, 0xfe, b'h', b'i'];
        let ingested = store.ingest("binary.bin", &bytes).unwrap();
        assert!(ingested.preview.contains('\u{FFFD}'));
        assert!(ingested.preview.ends_with("hi"));
        // Raw copy is byte-for-byte, not the lossy decode
        let raw = std::fs::read(store.dir().join("binary.bin")).unwrap();
        assert_eq!(raw, bytes);
    }

    #[test]
    fn test_ingest_overwrites_same_name() {
        let (store, _tmp) = temp_store(4);
        store.ingest("sample.txt", b"first version").unwrap();
        store.ingest("sample.txt", b"second").unwrap();

        let raw = std::fs::read(store.dir().join("sample.txt")).unwrap();
        assert_eq!(raw, b"second");
        let sidecar = std::fs::read(store.dir().join("sample.txt.json")).unwrap();
        let record: AttachmentRecord = serde_json::from_slice(&sidecar).unwrap();
        assert_eq!(record.chunks, vec!["seco", "nd"]);
    }

    #[test]
    fn test_ingest_file_reads_from_disk() {
        let (store, tmp) = temp_store(4);
        let source = tmp.path().join("upload.txt");
        std::fs::write(&source, b"ABCDEFGHIJ").unwrap();

        let ingested = store.ingest_file(&source).unwrap();
        assert_eq!(ingested.chunks, vec!["ABCD", "EFGH", "IJ"]);
        assert!(store.dir().join("upload.txt").exists());
        assert!(store.dir().join("upload.txt.json").exists());
    }

    #[test]
    fn test_ingest_file_missing_path_fails() {
        let (store, tmp) = temp_store(4);
        let result = store.ingest_file(&tmp.path().join("nope.txt"));
        assert!(result.is_err());
        let message = result.unwrap_err().to_string();
        assert!(message.starts_with("Ingest error:"), "{}", message);
        assert!(message.contains("Failed to read"), "{}", message);
    }

    #[test]
    fn test_ingest_file_uses_final_path_component() {
        let (store, tmp) = temp_store(1000);
        let nested = tmp.path().join("deep").join("dir");
        std::fs::create_dir_all(&nested).unwrap();
        let source = nested.join("report.txt");
        std::fs::write(&source, b"content").unwrap();

        store.ingest_file(&source).unwrap();
        assert!(store.dir().join("report.txt").exists());
    }
}
