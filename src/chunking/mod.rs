//! Sentence-boundary text chunking.
//!
//! The TTS provider caps the characters accepted per request, so voice-over
//! text is split into chunks that respect sentence boundaries wherever
//! possible.

use crate::error::{FortellError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Matches the end of a sentence followed by whitespace.
///
/// Terminators may be followed by closing quotes or brackets before the gap.
fn sentence_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[.!?…]+["')\]]*\s+"#).expect("valid regex"))
}

/// Number of characters (not bytes) in a string.
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split text into sentences, keeping terminators attached.
///
/// Whitespace around each sentence is trimmed. Text without any sentence
/// terminator is returned as a single sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in sentence_end_re().find_iter(text) {
        let sentence = text[start..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = m.end();
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Sentences are packed greedily and never split across chunks, unless a
/// single sentence alone exceeds `max_chars` (then it is split at word
/// boundaries). Chunk order follows input order.
pub fn chunk_text(text: &str, max_chars: usize) -> Result<Vec<String>> {
    if max_chars == 0 {
        return Err(FortellError::InvalidInput(
            "chunk size must be at least 1 character".to_string(),
        ));
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        let pieces = if char_len(&sentence) > max_chars {
            split_long_sentence(&sentence, max_chars)
        } else {
            vec![sentence]
        };

        for piece in pieces {
            let piece_len = char_len(&piece);
            if current.is_empty() {
                current = piece;
                current_len = piece_len;
            } else if current_len + 1 + piece_len <= max_chars {
                current.push(' ');
                current.push_str(&piece);
                current_len += 1 + piece_len;
            } else {
                chunks.push(std::mem::take(&mut current));
                current = piece;
                current_len = piece_len;
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    Ok(chunks)
}

/// Split a single oversized sentence at word boundaries.
///
/// A single word longer than `max_chars` is split mid-word as a last resort.
fn split_long_sentence(sentence: &str, max_chars: usize) -> Vec<String> {
    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in sentence.split_whitespace() {
        let word_len = char_len(word);

        if word_len > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            pieces.extend(split_word(word, max_chars));
            continue;
        }

        if current.is_empty() {
            current = word.to_string();
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            pieces.push(std::mem::take(&mut current));
            current = word.to_string();
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}

/// Split a single word into `max_chars`-sized pieces on char boundaries.
fn split_word(word: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect())
        .collect()
}
