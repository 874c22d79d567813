use std::collections::VecDeque;

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chunk::Chunk;
use crate::document::DocumentRecord;

/// Sizes are in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Tried in order; the empty separator splits into single characters.
    pub separators: Vec<String>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 700,
            chunk_overlap: 100,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }
}

impl ChunkerConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.chunk_size > 0, "chunk_size must be positive");
        ensure!(
            self.chunk_overlap < self.chunk_size,
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            self.chunk_overlap,
            self.chunk_size
        );
        Ok(())
    }
}

/// Recursive character splitter: prefers paragraph, then line, then word, then character
/// boundaries, and carries up to `chunk_overlap` characters into the next chunk.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.config.separators)
    }

    pub fn split_document(&self, doc: &DocumentRecord) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut search_from = 0;

        for text in self.split_text(&doc.text) {
            if text.trim().is_empty() {
                continue;
            }

            let found = doc
                .text
                .get(search_from..)
                .and_then(|rest| rest.find(text.as_str()))
                .map(|relative| search_from + relative);

            let (offset, lines) = match found {
                Some(start) => {
                    let end = start + text.len();
                    let first_line = doc.text[..start].matches('\n').count() + 1;
                    let last_line = first_line + text.matches('\n').count();
                    // Step one character so overlapping chunks are still found.
                    search_from = start + text.chars().next().map_or(1, char::len_utf8);
                    (Some((start, end)), Some((first_line, last_line)))
                }
                None => (None, None),
            };

            chunks.push(Chunk::new(
                doc.doc_id.clone(),
                text,
                doc.source.clone(),
                offset,
                lines,
            ));
        }

        chunks
    }

    pub fn split_documents(&self, docs: &[DocumentRecord]) -> Vec<Chunk> {
        docs.iter().flat_map(|doc| self.split_document(doc)).collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut good_splits: Vec<&str> = Vec::new();
        for piece in split_on_separator(text, separator) {
            if char_len(piece) < self.config.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if remaining.is_empty() {
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Pieces already carry their separators, so they are concatenated as is.
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let chunk_size = self.config.chunk_size;
        let chunk_overlap = self.config.chunk_overlap;

        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for &piece in splits {
            let len = char_len(piece);

            if total + len > chunk_size {
                if total > chunk_size {
                    warn!(
                        size = total,
                        chunk_size, "Created a chunk larger than the configured size"
                    );
                }

                if !current.is_empty() {
                    if let Some(doc) = join_docs(&current) {
                        docs.push(doc);
                    }

                    // Drop leading pieces until what is left fits as overlap.
                    while total > chunk_overlap || (total + len > chunk_size && total > 0) {
                        match current.pop_front() {
                            Some(first) => total = total.saturating_sub(char_len(first)),
                            None => break,
                        }
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        if let Some(doc) = join_docs(&current) {
            docs.push(doc);
        }

        docs
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn split_on_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    } else {
        // Cut before every position the separator starts at, so each separator stays
        // attached to the piece that follows it and runs of separators survive.
        let mut pieces = Vec::new();
        let mut start = 0;
        for (i, _) in text.char_indices().skip(1) {
            if text[i..].starts_with(separator) {
                pieces.push(&text[start..i]);
                start = i;
            }
        }
        pieces.push(&text[start..]);
        pieces
    }
}

fn join_docs(docs: &VecDeque<&str>) -> Option<String> {
    let joined: String = docs.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
