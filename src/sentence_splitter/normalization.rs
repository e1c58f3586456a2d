// WHY: card sentences are sent trimmed and on one line, while spans keep raw text for offsets

/// Normalize a sentence for use as a card sentence: trim, and collapse whitespace runs
/// (including line breaks and full-width spaces) into a single ASCII space
pub fn normalize_sentence(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    normalize_sentence_into(text, &mut result);
    result
}

/// Normalize into a supplied buffer so batch callers can reuse it
pub fn normalize_sentence_into(text: &str, buffer: &mut String) {
    buffer.clear();
    buffer.reserve(text.len());

    let mut pending_space = false;
    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            buffer.push(' ');
            pending_space = false;
        }
        buffer.push(ch);
    }
}
