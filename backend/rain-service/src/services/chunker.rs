//! Word-bounded chunker: splits article markdown into feed-sized slices.
//!
//! Paragraphs are accumulated up to the word target; oversized paragraphs
//! are split at sentence boundaries, and oversized sentences by raw word
//! count, so no chunk meaningfully exceeds the target.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n{2,}").expect("valid paragraph regex");
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    pub content: String,
    pub word_count: i32,
}

fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_blank = false;
    for ch in text.replace("\r\n", "\n").chars() {
        if ch == ' ' || ch == '\t' {
            if !in_blank {
                out.push(' ');
            }
            in_blank = true;
        } else {
            out.push(ch);
            in_blank = false;
        }
    }
    out.trim().to_string()
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

fn is_sentence_opener(ch: char) -> bool {
    ch.is_ascii_uppercase() || ch.is_ascii_digit() || matches!(ch, '"' | '\'' | '`' | '(')
}

/// Split on terminal punctuation followed by whitespace and a likely
/// sentence opener. Abbreviation-heavy prose will occasionally over-split;
/// downstream word packing keeps that harmless.
fn split_sentences(text: &str) -> Vec<String> {
    let normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = normalized.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        current.push(ch);

        if matches!(ch, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j > i + 1 && j < chars.len() && is_sentence_opener(chars[j]) {
                let sentence = current.trim().to_string();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                current.clear();
                i = j;
                continue;
            }
        }
        i += 1;
    }

    let tail = current.trim().to_string();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

fn split_by_words(text: &str, target_words: usize) -> Vec<String> {
    let normalized = normalize_whitespace(text);
    let words: Vec<&str> = normalized.split_whitespace().collect();
    words
        .chunks(target_words.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}

fn split_large_paragraph(paragraph: &str, target_words: usize) -> Vec<String> {
    let sentences = split_sentences(paragraph);
    if sentences.len() <= 1 {
        return split_by_words(paragraph, target_words);
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_count = 0usize;

    for sentence in sentences {
        let sentence_count = count_words(&sentence);
        if sentence_count > target_words {
            if !current.is_empty() {
                chunks.push(current.trim().to_string());
                current.clear();
                current_count = 0;
            }
            chunks.extend(split_by_words(&sentence, target_words));
            continue;
        }

        if current_count + sentence_count <= target_words {
            if current.is_empty() {
                current = sentence;
            } else {
                current.push(' ');
                current.push_str(&sentence);
            }
            current_count += sentence_count;
            continue;
        }

        chunks.push(current.trim().to_string());
        current = sentence;
        current_count = sentence_count;
    }

    if !current.is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks.retain(|c| !c.is_empty());
    chunks
}

/// Chunk article markdown into word-bounded slices, preserving paragraph
/// boundaries where the target allows.
pub fn chunk_text(markdown: &str, target_words: usize) -> Vec<ChunkResult> {
    let clean = markdown.trim();
    if clean.is_empty() {
        return Vec::new();
    }

    let paragraphs: Vec<String> = PARAGRAPH_BREAK
        .split(clean)
        .map(normalize_whitespace)
        .filter(|p| !p.is_empty())
        .collect();

    let mut chunks: Vec<ChunkResult> = Vec::new();
    let mut current_parts: Vec<String> = Vec::new();
    let mut current_words = 0usize;

    let flush = |parts: &mut Vec<String>, words: &mut usize, out: &mut Vec<ChunkResult>| {
        if parts.is_empty() {
            return;
        }
        let content = parts.join("\n\n").trim().to_string();
        let word_count = count_words(&content);
        if !content.is_empty() && word_count > 0 {
            out.push(ChunkResult {
                content,
                word_count: word_count as i32,
            });
        }
        parts.clear();
        *words = 0;
    };

    for paragraph in paragraphs {
        let paragraph_words = count_words(&paragraph);

        if paragraph_words > target_words {
            flush(&mut current_parts, &mut current_words, &mut chunks);
            for part in split_large_paragraph(&paragraph, target_words) {
                let word_count = count_words(&part);
                chunks.push(ChunkResult {
                    content: part,
                    word_count: word_count as i32,
                });
            }
            continue;
        }

        if current_words + paragraph_words <= target_words {
            current_parts.push(paragraph);
            current_words += paragraph_words;
        } else {
            flush(&mut current_parts, &mut current_words, &mut chunks);
            current_parts.push(paragraph);
            current_words = paragraph_words;
        }
    }

    flush(&mut current_parts, &mut current_words, &mut chunks);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", 200).is_empty());
        assert!(chunk_text("   \n\n  ", 200).is_empty());
    }

    #[test]
    fn small_paragraphs_accumulate_into_one_chunk() {
        let text = "One two three.\n\nFour five six.";
        let chunks = chunk_text(text, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "One two three.\n\nFour five six.");
        assert_eq!(chunks[0].word_count, 6);
    }

    #[test]
    fn paragraph_break_flushes_when_target_exceeded() {
        let text = "alpha beta gamma delta\n\nepsilon zeta eta theta";
        let chunks = chunk_text(text, 5);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].word_count, 4);
        assert_eq!(chunks[1].word_count, 4);
    }

    #[test]
    fn oversized_paragraph_splits_at_sentence_boundaries() {
        let text = "First sentence here today. Second sentence also here. Third one closes it.";
        let chunks = chunk_text(text, 8);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.word_count <= 8, "chunk too large: {:?}", chunk);
        }
    }

    #[test]
    fn giant_single_sentence_splits_by_words() {
        let words = vec!["word"; 30].join(" ");
        let chunks = chunk_text(&words, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.word_count == 10));
    }

    #[test]
    fn normalizes_tabs_and_carriage_returns() {
        let text = "a\tb  c\r\n\r\nd e";
        let chunks = chunk_text(text, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "a b c\n\nd e");
    }
}
