//! Chapter boundary detection.
//!
//! Heading patterns are tried in priority order and the first one that finds
//! more than one heading decides the chapter boundaries. Text without any
//! recognised structure is cut into fixed-size sections instead.

use super::Chapter;
use super::cleaner::{MIN_CHAPTER_CHARS, is_substantial};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// Default section size in characters when no headings are found.
pub const DEFAULT_SECTION_CHARS: usize = 3000;

static CHAPTER_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*chapter[ \t]+(\d+|[ivxlcdm]+)\b[ \t]*(?:[:.\-–—][ \t]*)?([^\r\n]*)")
        .expect("valid chapter heading regex")
});

static NUMBERED_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(\d{1,3})\.[ \t]+([^\r\n]{1,100}?)[ \t]*\r?$")
        .expect("valid numbered heading regex")
});

static PART_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*part[ \t]+(\d+|[ivxlcdm]+)\b[ \t]*(?:[:.\-–—][ \t]*)?([^\r\n]*)")
        .expect("valid part heading regex")
});

static SECTION_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^[ \t]*section[ \t]+(\d+(?:\.\d+)*|[ivxlcdm]+)\b[ \t]*(?:[:.\-–—][ \t]*)?([^\r\n]*)",
    )
    .expect("valid section heading regex")
});

static ROMAN_NUMERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^m{0,3}(?:cm|cd|d?c{0,3})(?:xc|xl|l?x{0,3})(?:ix|iv|v?i{0,3})$")
        .expect("valid roman numeral regex")
});

/// Options controlling chapter detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorOptions {
    /// Section size used when the text has no recognised headings
    pub section_chars: usize,
    /// Chapters whose trimmed content is this long or shorter are dropped
    pub min_chapter_chars: usize,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            section_chars: DEFAULT_SECTION_CHARS,
            min_chapter_chars: MIN_CHAPTER_CHARS,
        }
    }
}

/// Structural heading styles, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingPattern {
    /// "Chapter 3: Title" or "Chapter IV"
    Chapter,
    /// "3. Title"
    Numbered,
    /// "Part 2"
    Part,
    /// "Section 1.2"
    Section,
}

impl HeadingPattern {
    /// Patterns in priority order.
    pub const PRIORITY: [HeadingPattern; 4] = [
        HeadingPattern::Chapter,
        HeadingPattern::Numbered,
        HeadingPattern::Part,
        HeadingPattern::Section,
    ];

    /// Find all headings of this style in document order.
    pub fn find_headings(self, text: &str) -> Vec<HeadingMatch> {
        match self {
            HeadingPattern::Chapter => find_chapter_headings(text),
            HeadingPattern::Numbered => find_numbered_headings(text),
            HeadingPattern::Part => find_part_headings(text),
            HeadingPattern::Section => find_section_headings(text),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HeadingPattern::Chapter => "chapter",
            HeadingPattern::Numbered => "numbered",
            HeadingPattern::Part => "part",
            HeadingPattern::Section => "section",
        }
    }
}

/// A heading located in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    /// Byte offset of the heading line
    pub start: usize,
    /// Heading label such as "Chapter 3", if the style has one
    pub label: Option<String>,
    /// Title text following the label
    pub subtitle: Option<String>,
}

impl HeadingMatch {
    /// Title for the chapter introduced by this heading.
    ///
    /// `position` is the 1-based detection order, used when nothing was captured.
    pub fn title(&self, position: usize) -> String {
        match (&self.label, &self.subtitle) {
            (Some(label), Some(subtitle)) => format!("{}: {}", label, subtitle),
            (Some(label), None) => label.clone(),
            (None, Some(subtitle)) => subtitle.clone(),
            (None, None) => format!("Chapter {}", position),
        }
    }
}

pub fn find_chapter_headings(text: &str) -> Vec<HeadingMatch> {
    labelled_headings(&CHAPTER_HEADING, text, "Chapter")
}

pub fn find_numbered_headings(text: &str) -> Vec<HeadingMatch> {
    NUMBERED_HEADING
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(HeadingMatch {
                start: whole.start(),
                label: None,
                subtitle: non_empty(caps.get(2).map(|m| m.as_str())),
            })
        })
        .collect()
}

pub fn find_part_headings(text: &str) -> Vec<HeadingMatch> {
    labelled_headings(&PART_HEADING, text, "Part")
}

pub fn find_section_headings(text: &str) -> Vec<HeadingMatch> {
    labelled_headings(&SECTION_HEADING, text, "Section")
}

/// Shared matcher for "<Label> <number> [sep] [title]" heading styles.
fn labelled_headings(pattern: &Regex, text: &str, label: &str) -> Vec<HeadingMatch> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?.as_str();
            if !is_heading_number(number) {
                return None;
            }
            Some(HeadingMatch {
                start: whole.start(),
                label: Some(format!("{} {}", label, number)),
                subtitle: non_empty(caps.get(2).map(|m| m.as_str())),
            })
        })
        .collect()
}

/// Accept decimal numbers (optionally dotted) and well-formed Roman numerals.
fn is_heading_number(number: &str) -> bool {
    if number.starts_with(|c: char| c.is_ascii_digit()) {
        return true;
    }
    ROMAN_NUMERAL.is_match(number)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Split text on the first heading style that occurs more than once.
///
/// Returns `None` when no style qualifies. The returned chapters cover the
/// whole text: any preamble before the first heading belongs to the first
/// chapter, and each chapter ends where the next heading begins.
pub fn split_on_headings(text: &str) -> Option<(HeadingPattern, Vec<Chapter>)> {
    for pattern in HeadingPattern::PRIORITY {
        let headings = pattern.find_headings(text);
        debug!("{} headings: {} match(es)", pattern.name(), headings.len());

        if headings.len() > 1 {
            return Some((pattern, chapters_from_headings(text, &headings)));
        }
    }
    None
}

fn chapters_from_headings(text: &str, headings: &[HeadingMatch]) -> Vec<Chapter> {
    headings
        .iter()
        .enumerate()
        .map(|(i, heading)| {
            let position = i + 1;
            let start = if i == 0 { 0 } else { heading.start };
            let end = headings.get(i + 1).map_or(text.len(), |next| next.start);

            Chapter::new(
                format!("chapter-{}", position),
                heading.title(position),
                &text[start..end],
            )
        })
        .collect()
}

/// Cut unstructured text into sections of at most `budget` characters.
///
/// Words are never broken: a section closes once appending the next word
/// would exceed the budget, and that word opens the next section. A single
/// word longer than the budget becomes its own oversized section.
pub fn split_into_sections(text: &str, budget: usize) -> Vec<Chapter> {
    let mut bodies = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if !current.is_empty() && current_len + 1 + word_len > budget {
            bodies.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        bodies.push(current);
    }

    bodies
        .into_iter()
        .enumerate()
        .map(|(i, body)| {
            let position = i + 1;
            Chapter::new(
                format!("section-{}", position),
                format!("Section {}", position),
                body,
            )
        })
        .collect()
}

/// Detect chapters in extracted document text.
///
/// Falls back to fixed-size sections when no heading style occurs more than
/// once, then drops chapters too short to narrate. An empty result means the
/// document has no usable content.
pub fn detect_chapters(text: &str, options: &DetectorOptions) -> Vec<Chapter> {
    let chapters = match split_on_headings(text) {
        Some((pattern, chapters)) => {
            debug!("Using {} headings: {} chapter(s)", pattern.name(), chapters.len());
            chapters
        }
        None => {
            debug!(
                "No heading style repeats; splitting into {}-character sections",
                options.section_chars
            );
            split_into_sections(text, options.section_chars)
        }
    };

    let total = chapters.len();
    let kept: Vec<Chapter> = chapters
        .into_iter()
        .filter(|c| is_substantial(&c.content, options.min_chapter_chars))
        .collect();

    if kept.len() < total {
        debug!("Dropped {} chapter(s) too short to narrate", total - kept.len());
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn filler(words: usize) -> String {
        vec!["lorem"; words].join(" ")
    }

    #[test]
    fn test_chapter_headings_numeric_and_roman() {
        let text = "Chapter 1: Intro\nbody\nCHAPTER IV - The End\nmore\nchapter 12\nlast";
        let headings = find_chapter_headings(text);
        assert_eq!(headings.len(), 3);
        assert_eq!(headings[0].title(1), "Chapter 1: Intro");
        assert_eq!(headings[1].title(2), "Chapter IV: The End");
        assert_eq!(headings[2].title(3), "Chapter 12");
        assert_eq!(headings[0].start, 0);
        assert_eq!(headings[1].start, text.find("CHAPTER IV").unwrap());
    }

    #[test]
    fn test_chapter_heading_requires_line_start() {
        let text = "As shown in chapter 3 we go on.\nAnd chapter 4 too.";
        assert!(find_chapter_headings(text).is_empty());
    }

    #[test]
    fn test_chapter_heading_rejects_words_made_of_roman_letters() {
        let text = "Chapter did not end\nChapter mild weather";
        assert!(find_chapter_headings(text).is_empty());
    }

    #[test]
    fn test_numbered_headings() {
        let text = "1. Getting Started\ntext here\n2. Going Further  \nmore text\n3.14 is not a heading";
        let headings = find_numbered_headings(text);
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].title(1), "Getting Started");
        assert_eq!(headings[1].title(2), "Going Further");
    }

    #[test]
    fn test_part_and_section_headings() {
        let parts = find_part_headings("Part I\nx\nPart II: Return\ny");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].title(2), "Part II: Return");

        let sections = find_section_headings("Section 1.2\nx\nsection 3. Results\ny");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title(1), "Section 1.2");
        assert_eq!(sections[1].title(2), "Section 3: Results");
    }

    #[test]
    fn test_title_synthesized_when_nothing_captured() {
        let heading = HeadingMatch {
            start: 0,
            label: None,
            subtitle: None,
        };
        assert_eq!(heading.title(7), "Chapter 7");
    }

    #[test]
    fn test_chapter_pattern_takes_priority() {
        let text = "Chapter 1\n1. First point\nChapter 2\n2. Second point\n3. Third point";
        let (pattern, chapters) = split_on_headings(text).unwrap();
        assert_eq!(pattern, HeadingPattern::Chapter);
        assert_eq!(chapters.len(), 2);
    }

    #[test]
    fn test_single_heading_falls_through_to_next_pattern() {
        let text = "Chapter 1\nintro\nPart 1\nalpha\nPart 2\nbeta";
        let (pattern, chapters) = split_on_headings(text).unwrap();
        assert_eq!(pattern, HeadingPattern::Part);
        assert_eq!(chapters[0].title, "Part 1");
        assert_eq!(chapters[1].title, "Part 2");
    }

    #[test]
    fn test_spans_follow_heading_offsets() {
        let text = "Preface words\nChapter 1: A\nfirst body\nChapter 2: B\nsecond body";
        let (_, chapters) = split_on_headings(text).unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].id, "chapter-1");
        assert_eq!(chapters[0].content, "Preface words\nChapter 1: A\nfirst body\n");
        assert_eq!(chapters[1].id, "chapter-2");
        assert_eq!(chapters[1].content, "Chapter 2: B\nsecond body");
    }

    #[test]
    fn test_short_chapters_are_dropped() {
        let body = "word ".repeat(600);
        let text = format!("Chapter 1\nHi\nChapter 2\n{}", body);
        let chapters = detect_chapters(&text, &DetectorOptions::default());
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].id, "chapter-2");
        assert_eq!(chapters[0].title, "Chapter 2");
    }

    #[test]
    fn test_boundary_at_exactly_min_chars_is_dropped() {
        let options = DetectorOptions {
            section_chars: 3000,
            min_chapter_chars: 10,
        };
        // "abcde abcd" is exactly 10 characters
        let chapters = detect_chapters("abcde abcd", &options);
        assert!(chapters.is_empty());

        let chapters = detect_chapters("abcde abcde", &options);
        assert_eq!(chapters.len(), 1);
    }

    #[test]
    fn test_fallback_sections() {
        let text = filler(1000);
        let chapters = detect_chapters(&text, &DetectorOptions::default());
        assert!(chapters.len() > 1);
        assert_eq!(chapters[0].id, "section-1");
        assert_eq!(chapters[0].title, "Section 1");
        assert_eq!(chapters[1].id, "section-2");
        for chapter in &chapters {
            assert!(chapter.content.chars().count() <= DEFAULT_SECTION_CHARS);
        }
    }

    #[test]
    fn test_fallback_oversized_word_gets_own_section() {
        let long_word = "x".repeat(20);
        let text = format!("aa bb {} cc", long_word);
        let sections = split_into_sections(&text, 10);
        let bodies: Vec<&str> = sections.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(bodies, vec!["aa bb", long_word.as_str(), "cc"]);
    }

    #[test]
    fn test_whitespace_only_text_yields_nothing() {
        assert!(detect_chapters(" \n\t ", &DetectorOptions::default()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_heading_chapters_reconstruct_text(
            preamble in "[a-z ]{0,20}",
            chapters in prop::collection::vec(
                ("[a-z]{1,10}", "[a-z]{1,10}( [a-z]{1,10}){0,30}"),
                2..8,
            ),
        ) {
            let mut text = preamble.clone();
            for (i, (title, body)) in chapters.iter().enumerate() {
                text.push_str(&format!("\nChapter {}: {}\n{}\n", i + 1, title, body));
            }

            let (pattern, detected) = split_on_headings(&text).unwrap();
            prop_assert_eq!(pattern, HeadingPattern::Chapter);
            prop_assert_eq!(detected.len(), chapters.len());

            let rebuilt: String = detected.iter().map(|c| c.content.as_str()).collect();
            prop_assert_eq!(rebuilt, text);

            for (i, chapter) in detected.iter().enumerate() {
                prop_assert_eq!(&chapter.id, &format!("chapter-{}", i + 1));
                prop_assert_eq!(&chapter.title, &format!("Chapter {}: {}", i + 1, chapters[i].0));
            }
        }

        #[test]
        fn prop_sections_respect_budget(
            words in prop::collection::vec("[a-z]{1,15}", 1..400),
            budget in 20usize..300,
        ) {
            let text = words.join("  ");
            let sections = split_into_sections(&text, budget);

            for section in &sections {
                prop_assert!(section.content.chars().count() <= budget);
            }

            let rebuilt: Vec<&str> = sections.iter().map(|s| s.content.as_str()).collect();
            prop_assert_eq!(rebuilt.join(" "), words.join(" "));
        }
    }
}
