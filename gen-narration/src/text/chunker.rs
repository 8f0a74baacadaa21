//! Splitting chapter text into synthesis-sized chunks.

use super::TextChunk;
use once_cell::sync::Lazy;
use regex::Regex;

/// Default maximum chunk size. Cloud TTS rejects input over 5000 bytes.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 5000;

/// Terminal punctuation followed by whitespace ends a sentence.
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+\s+").expect("valid sentence boundary regex"));

/// Split text into sentences.
///
/// The boundary punctuation is consumed and every sentence is re-terminated
/// with a single period, so "Really?" becomes "Really.".
pub fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE_BOUNDARY
        .split(text)
        .filter_map(|sentence| {
            let sentence = sentence
                .trim()
                .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?'))
                .trim_end();
            if sentence.is_empty() {
                None
            } else {
                Some(format!("{}.", sentence))
            }
        })
        .collect()
}

/// Group sentences into chunks of at most `max_chars` UTF-8 bytes.
///
/// The budget is a request-size limit, so it is measured in bytes; for ASCII
/// text that is the character count. Sentences are accumulated greedily; when the next sentence would push the
/// current chunk over budget the chunk is closed and the sentence starts a
/// new one. A single sentence longer than the budget is emitted on its own,
/// so the budget is a soft cap.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.len();

        if !current.is_empty() && current_len + 1 + sentence_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(&sentence);
        current_len += sentence_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Split one chapter's text into ordered chunks.
///
/// Sequence numbers start at 0 and have no gaps.
pub fn split_chapter(chapter_id: &str, text: &str, max_chars: usize) -> Vec<TextChunk> {
    chunk_text(text, max_chars)
        .into_iter()
        .enumerate()
        .map(|(sequence, text)| TextChunk::new(chapter_id, sequence, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_chunk_short_text() {
        let chunks = chunk_text("Hello world. How are you?", 5000);
        assert_eq!(chunks, vec!["Hello world. How are you."]);
    }

    #[test]
    fn test_sentences_are_reterminated() {
        let sentences = split_sentences("Stop! Who goes there?  Nobody...\nFine.");
        assert_eq!(sentences, vec!["Stop.", "Who goes there.", "Nobody.", "Fine."]);
    }

    #[test]
    fn test_chunk_long_text() {
        let text = "First sentence. Second sentence. Third sentence. Fourth sentence. Fifth sentence. Sixth sentence. Seventh sentence. Eighth sentence.";
        let chunks = chunk_text(text, 50);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "Chunk too long: {}", chunk);
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_chunk_closes_exactly_at_budget() {
        // "Aaaa. Bbbb." is 11 characters
        assert_eq!(chunk_text("Aaaa. Bbbb.", 11), vec!["Aaaa. Bbbb."]);
        assert_eq!(chunk_text("Aaaa. Bbbb.", 10), vec!["Aaaa.", "Bbbb."]);
    }

    #[test]
    fn test_oversized_sentence_is_its_own_chunk() {
        let long = format!("{} end", "word ".repeat(30).trim());
        let text = format!("Short one. {}. Tail here.", long);
        let chunks = chunk_text(&text, 40);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "Short one.");
        assert_eq!(chunks[1], format!("{}.", long));
        assert_eq!(chunks[2], "Tail here.");
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_text("", 5000).is_empty());
        assert!(chunk_text("   \n\n   ", 5000).is_empty());
        assert!(chunk_text("... !!! ", 5000).is_empty());
    }

    #[test]
    fn test_split_chapter() {
        let chunks = split_chapter("chapter-3", "Hello world. This is a test.", 5000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chapter_id, "chapter-3");
        assert_eq!(chunks[0].sequence, 0);
        assert_eq!(chunks[0].text, "Hello world. This is a test.");
    }

    #[test]
    fn test_split_chapter_multiple_chunks() {
        let text = "First sentence. Second sentence. Third sentence. Fourth sentence. Fifth sentence.";
        let chunks = split_chapter("section-5", text, 30);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chapter_id == "section-5"));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.sequence, i);
        }
    }

    #[test]
    fn test_budget_counts_utf8_bytes() {
        // 10 Cyrillic letters, a space and a period: 12 chars, 22 bytes
        let sentence = "Привет всем.";
        assert_eq!(sentence.len(), 22);
        let text = vec![sentence; 400].join(" ");

        let chunks = chunk_text(&text, DEFAULT_MAX_CHUNK_CHARS);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= DEFAULT_MAX_CHUNK_CHARS, "chunk is {} bytes", chunk.len());
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_multibyte_sentences_close_on_bytes() {
        // "Ёж." is 3 chars but 5 bytes; two joined are 11 bytes
        assert_eq!(chunk_text("Ёж. Ёж.", 11), vec!["Ёж. Ёж."]);
        assert_eq!(chunk_text("Ёж. Ёж.", 10), vec!["Ёж.", "Ёж."]);
    }

    proptest! {
        #[test]
        fn prop_chunks_respect_budget_and_order(
            sentences in prop::collection::vec("[a-z]{1,12}( [a-z]{1,12}){0,15}", 1..60),
            budget in 10usize..400,
        ) {
            let text = format!("{}.", sentences.join(". "));
            let chunks = split_chapter("chapter-1", &text, budget);

            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.sequence, i);
                let single_sentence = !chunk.text.contains(". ");
                prop_assert!(chunk.text.chars().count() <= budget || single_sentence);
            }

            let rebuilt: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
            prop_assert_eq!(rebuilt.join(" "), text);
        }
    }
}
