//! Separator-based text splitting measured in (estimated) tokens.

use std::collections::VecDeque;

use crate::models::{Document, SummarizerConfig};
use crate::utils::estimate_tokens;

/// Separators tried in order; a piece still over `chunk_size` falls through to the next.
pub const SEPARATORS: &[&str] = &["\n\n", "\n", " "];

/// Splits text on blank lines, then greedily merges pieces up to `chunk_size` tokens.
///
/// A piece longer than `chunk_size` is split again on line breaks, then on spaces,
/// and finally cut by characters, so no chunk exceeds `chunk_size`.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size),
        }
    }

    pub fn from_config(config: &SummarizerConfig) -> Self {
        Self::new(config.chunk_size as usize, config.chunk_overlap as usize)
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_level(text, 0)
    }

    /// Split every document, copying its metadata onto each chunk.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.page_content)
                    .into_iter()
                    .map(|chunk| Document::new(chunk, doc.metadata.clone()))
            })
            .collect()
    }

    fn split_level(&self, text: &str, level: usize) -> Vec<String> {
        let separator = SEPARATORS[level];
        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in text.split(separator).map(str::trim).filter(|s| !s.is_empty()) {
            if estimate_tokens(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            if level + 1 < SEPARATORS.len() {
                chunks.extend(self.split_level(piece, level + 1));
            } else {
                chunks.extend(self.cut(piece));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }
        chunks
    }

    /// Last resort for a run of text with no separator at all.
    fn cut(&self, piece: &str) -> Vec<String> {
        let chars: Vec<char> = piece.chars().collect();
        chars
            .chunks(self.chunk_size * 4)
            .map(|c| c.iter().collect())
            .collect()
    }

    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let separator_len = estimate_tokens(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = estimate_tokens(piece);
            let joined_len = if current.is_empty() { 0 } else { separator_len };

            if total + len + joined_len > self.chunk_size && !current.is_empty() {
                chunks.push(join(&current, separator));

                // Keep a tail of the previous chunk as overlap, if it still fits.
                while total > self.chunk_overlap
                    || (total + len + separator_len > self.chunk_size && total > 0)
                {
                    let Some((_, removed)) = current.pop_front() else {
                        break;
                    };
                    total -= removed + if current.is_empty() { 0 } else { separator_len };
                }
            }

            let joined_len = if current.is_empty() { 0 } else { separator_len };
            total += len + joined_len;
            current.push_back((piece, len));
        }

        if !current.is_empty() {
            chunks.push(join(&current, separator));
        }

        chunks
    }
}

fn join(pieces: &VecDeque<(&str, usize)>, separator: &str) -> String {
    pieces
        .iter()
        .map(|(p, _)| *p)
        .collect::<Vec<_>>()
        .join(separator)
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::from_config(&SummarizerConfig::default())
    }
}
