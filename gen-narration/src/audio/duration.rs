//! Playback duration estimate from word count.

/// Average narration speed used for estimates.
pub const WORDS_PER_MINUTE: u64 = 150;

/// Estimated playback time of `text` in whole seconds, rounded up.
pub fn estimate_duration_secs(text: &str) -> u64 {
    let words = text.split_whitespace().count() as u64;
    (words * 60).div_ceil(WORDS_PER_MINUTE)
}
