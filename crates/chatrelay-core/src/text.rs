pub fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    let len = s.len();
    if index >= len {
        return len;
    }

    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }

    index
}

/// Split `text` into chunks of at most `max_len` bytes, preferring to break
/// on a newline. The newline at a break is dropped.
pub fn split_text(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let chunk_len = if remaining.len() <= max_len {
            remaining.len()
        } else {
            let boundary = floor_char_boundary(remaining, max_len);
            if boundary == 0 {
                // Limit is narrower than one character; emit it whole.
                remaining.chars().next().map_or(1, char::len_utf8)
            } else {
                match remaining[..boundary].rfind('\n') {
                    Some(0) | None => boundary,
                    Some(pos) => pos,
                }
            }
        };
        chunks.push(remaining[..chunk_len].to_string());
        remaining = &remaining[chunk_len..];
        if let Some(rest) = remaining.strip_prefix('\n') {
            remaining = rest;
        }
    }
    chunks
}

/// Append the sender annotation the model sees on every user message.
pub fn annotate_user_message(message: &str, display_name: &str) -> String {
    format!("{message}. Username: {display_name}")
}
