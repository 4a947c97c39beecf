//! Extracts the first balanced `{...}` JSON object from LLM output.
//!
//! Models wrap JSON in prose ("here is the analysis: {...} thanks") or code
//! fences, so the response is scanned for the first `{` and its matching
//! close brace. The scanner tracks string literals and escapes: a stray `}`
//! inside a red-flag description must not terminate the object early.

/// Returns the first balanced JSON object embedded in `text`, or `None` when
/// no opening brace is ever closed.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
