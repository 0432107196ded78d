const CONTEXT_CHARS: usize = 100;

/// Finds `needle` in `haystack` ignoring case.
///
/// Returns the char range `start..end` of the first match in `haystack`. The
/// range can differ in length from `needle` when lowercasing expands a char.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }
    let hay: Vec<char> = haystack.chars().collect();

    (0..hay.len()).find_map(|start| {
        matched_len(&hay[start..], &needle).map(|len| (start, start + len))
    })
}

/// Number of leading `hay` chars whose lowercase form covers `needle`, if it matches.
fn matched_len(hay: &[char], needle: &[char]) -> Option<usize> {
    let mut pos = 0;
    for (consumed, c) in hay.iter().enumerate() {
        for folded in c.to_lowercase() {
            if pos == needle.len() {
                break;
            }
            if folded != needle[pos] {
                return None;
            }
            pos += 1;
        }
        if pos == needle.len() {
            return Some(consumed + 1);
        }
    }
    None
}

/// Cuts a window of context around the first case-insensitive match of `query`.
pub fn snippet(text: &str, query: &str) -> Option<String> {
    let (start, end) = find_ignore_case(text, query)?;
    let chars: Vec<char> = text.chars().collect();

    let from = start.saturating_sub(CONTEXT_CHARS);
    let to = (end + CONTEXT_CHARS).min(chars.len());

    let mut out = String::new();
    if from > 0 {
        out.push_str("...");
    }
    out.extend(&chars[from..to]);
    if to < chars.len() {
        out.push_str("...");
    }
    Some(out)
}

/// Labelled snippets for the title and content of a matching thread.
pub fn thread_matches(title: &str, content: &str, query: &str) -> Vec<String> {
    let mut matches = Vec::new();
    if let Some(s) = snippet(title, query) {
        matches.push(format!("Title: {s}"));
    }
    if let Some(s) = snippet(content, query) {
        matches.push(format!("Content: {s}"));
    }
    matches
}
