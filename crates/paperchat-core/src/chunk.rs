//! Recursive character text splitter.
//!
//! Splits extracted document text into overlapping [`Chunk`]s of at most
//! `chunk_size` characters (Unicode scalar values).
//!
//! # Algorithm
//!
//! 1. Pick the first separator from [`SEPARATORS`] that occurs in the text
//!    (paragraph break, line break, sentence end, space, then single
//!    characters).
//! 2. Split on it, keeping the separator at the start of the following piece.
//! 3. Any piece still `>= chunk_size` is split again with the remaining,
//!    finer separators.
//! 4. Merge the pieces greedily, in document order, into chunks of at most
//!    `chunk_size`.
//! 5. After emitting a chunk, keep its trailing pieces (at most
//!    `chunk_overlap` characters in total) as the start of the next one. If
//!    no whole piece fits, start the next chunk with the last `chunk_overlap`
//!    characters of the previous chunk, snapped forward to a word boundary.
//! 6. Trim each chunk and drop whitespace-only chunks.
//!
//! The output is a pure function of `(text, chunk_size, chunk_overlap)`.
//!
//! # Example
//!
//! ```rust
//! use paperchat_core::chunk::TextSplitter;
//!
//! let splitter = TextSplitter::new(40, 10).unwrap();
//! let chunks = splitter.split_text(
//!     "Neural networks are powerful. They require large datasets. Training takes time.",
//! );
//! assert!(chunks.len() >= 2);
//! assert!(chunks.iter().all(|c| c.chars().count() <= 40));
//! ```

use std::collections::VecDeque;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::Chunk;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Separators in priority order. The empty separator splits into characters.
pub const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Splitter parameters. Construct with [`TextSplitter::new`] to validate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl TextSplitter {
    /// Create a splitter. Fails unless `0 <= chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be > 0".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split `text` into ordered chunk texts.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        self.collect_pieces(text, &SEPARATORS, &mut pieces);
        self.merge_pieces(pieces)
    }

    /// Split a document's text into [`Chunk`]s with contiguous indices from 0.
    pub fn split_document(&self, document_name: &str, text: &str) -> Vec<Chunk> {
        self.split_text(text)
            .into_iter()
            .enumerate()
            .map(|(i, t)| make_chunk(document_name, i as i64, t))
            .collect()
    }

    fn collect_pieces(&self, text: &str, separators: &[&str], out: &mut Vec<String>) {
        let (separator, finer) = pick_separator(text, separators);
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size || finer.is_empty() {
                out.push(piece.to_string());
            } else {
                self.collect_pieces(piece, finer, out);
            }
        }
    }

    fn merge_pieces(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks: Vec<String> = Vec::new();
        let mut window: VecDeque<(String, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(&piece);

            if total + len > self.chunk_size && !window.is_empty() {
                let flushed = join_window(&window);

                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, l)) => total -= l,
                        None => break,
                    }
                }

                if let Some(chunk) = flushed {
                    if window.is_empty() {
                        let budget = self
                            .chunk_overlap
                            .min(self.chunk_size.saturating_sub(len));
                        let seed = overlap_tail(&chunk, budget);
                        if !seed.is_empty() {
                            let seed_len = char_len(&seed);
                            total += seed_len;
                            window.push_back((seed, seed_len));
                        }
                    }
                    chunks.push(chunk);
                }
            }

            total += len;
            window.push_back((piece, len));
        }

        if let Some(chunk) = join_window(&window) {
            chunks.push(chunk);
        }

        chunks
    }
}

/// First separator present in `text`, plus the finer separators after it.
fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return (sep, &[]);
        }
        if text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Split on `separator`, attaching each separator to the piece that follows it.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn join_window(window: &VecDeque<(String, usize)>) -> Option<String> {
    let joined: String = window.iter().map(|(p, _)| p.as_str()).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Last `budget` characters of `text`, starting at a word boundary when the
/// cut would otherwise land inside a word.
fn overlap_tail(text: &str, budget: usize) -> String {
    if budget == 0 {
        return String::new();
    }
    let total = char_len(text);
    if total <= budget {
        return text.to_string();
    }

    let start = text
        .char_indices()
        .nth(total - budget)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let tail = &text[start..];
    let mid_word = text[..start]
        .chars()
        .next_back()
        .is_some_and(|c| !c.is_whitespace());

    let tail = if mid_word {
        match tail.find(char::is_whitespace) {
            Some(pos) => &tail[pos..],
            None => tail,
        }
    } else {
        tail
    };
    tail.trim_start().to_string()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Create a single [`Chunk`] with a UUID and SHA-256 content hash.
fn make_chunk(document_name: &str, index: i64, text: String) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        document_name: document_name.to_string(),
        chunk_index: index,
        text,
        hash,
    }
}
