//! Local word accounting. Model-reported word counts are never trusted.

/// Number of whitespace-delimited tokens in `text`.
pub fn count_words(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

/// Prefix of `text` holding at most `limit` words, with the original spacing
/// between them preserved. Trailing whitespace after the last kept word is dropped.
pub fn truncate_to_words(text: &str, limit: u32) -> &str {
    if limit == 0 {
        return "";
    }

    let mut seen = 0u32;
    let mut in_word = false;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if in_word {
                in_word = false;
                if seen == limit {
                    return &text[..idx];
                }
            }
        } else if !in_word {
            in_word = true;
            seen += 1;
        }
    }
    text.trim_end()
}
