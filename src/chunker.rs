//! Fixed-size text chunking
//!
//! Splits attachment text into contiguous, non-overlapping pieces of a fixed
//! length measured in Unicode code points. Boundaries are purely count-based;
//! words and grapheme clusters may be split.

/// Default chunk length used for attachment ingestion.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Split `text` into chunks of `size` code points.
///
/// Every chunk has exactly `size` characters except possibly the last, and
/// concatenating the chunks in order reproduces `text` exactly. Empty input
/// yields an empty vector.
///
/// # Arguments
///
/// * `text` - The text to split
/// * `size` - Chunk length in code points; must be greater than zero
///
/// # Panics
///
/// Panics if `size` is zero.
///
/// # Examples
///
/// ```
/// use olloquy::chunker::chunk_text;
///
/// let chunks = chunk_text("ABCDEFGHIJ", 4);
/// assert_eq!(chunks, vec!["ABCD", "EFGH", "IJ"]);
/// ```
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}
