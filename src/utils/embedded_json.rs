/// Upper bound on how far a single embedded object is scanned
pub const MAX_EMBEDDED_JSON_LEN: usize = 4 * 1024 * 1024;

/// Return the balanced JSON object starting at `start`.
///
/// `text[start]` must be `{`. Braces are counted only outside string literals, and a backslash
/// inside a string escapes the byte after it. Returns `None` when the object does not close
/// within [`MAX_EMBEDDED_JSON_LEN`] bytes.
pub fn extract_balanced_json(text: &str, start: usize) -> Option<&str> {
    extract_balanced_json_within(text, start, MAX_EMBEDDED_JSON_LEN)
}

/// Same as [`extract_balanced_json`] with an explicit scan ceiling
pub fn extract_balanced_json_within(text: &str, start: usize, max_len: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let end = bytes.len().min(start.saturating_add(max_len));
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..end].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                // depth >= 1 here: the scan starts on '{' and returns as soon as it closes
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}
