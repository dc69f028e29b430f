//! Glob pattern pieces: brace expansion and per-segment matching.

use regex::Regex;

/// Expand `{a,b,c}` groups exhaustively, recursing for multiple groups.
/// A pattern without braces expands to itself.
pub fn brace_expand(pattern: &str) -> Vec<String> {
    let chars: Vec<char> = pattern.chars().collect();

    let open = match chars.iter().position(|&c| c == '{') {
        Some(open) => open,
        None => return vec![pattern.to_string()],
    };

    // Find the matching close brace and the top-level commas between.
    let mut depth = 0usize;
    let mut close = None;
    let mut commas = Vec::new();
    for (i, &c) in chars.iter().enumerate().skip(open) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            ',' if depth == 1 => commas.push(i),
            _ => {}
        }
    }

    let close = match close {
        Some(close) => close,
        // Unbalanced brace: treat the rest literally.
        None => return vec![pattern.to_string()],
    };

    let prefix: String = chars[..open].iter().collect();
    let suffix: String = chars[close + 1..].iter().collect();

    let mut alternatives = Vec::new();
    let mut start = open + 1;
    for &comma in &commas {
        alternatives.push(chars[start..comma].iter().collect::<String>());
        start = comma + 1;
    }
    alternatives.push(chars[start..close].iter().collect::<String>());

    let mut results = Vec::new();
    for alt in alternatives {
        let candidate = format!("{}{}{}", prefix, alt, suffix);
        results.extend(brace_expand(&candidate));
    }
    results
}

/// Compile one path segment into an anchored regex: `*` matches within the
/// segment, `?` one character, `[...]` classes are preserved, and all other
/// regex metacharacters are escaped.
pub fn segment_regex(segment: &str) -> Regex {
    let mut source = String::from("^");
    let chars: Vec<char> = segment.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => source.push_str("[^/]*"),
            '?' => source.push_str("[^/]"),
            '[' => {
                // Preserve the bracket expression verbatim when closed.
                if let Some(end) = chars[i + 1..].iter().position(|&c| c == ']') {
                    let class: String = chars[i..=i + 1 + end].iter().collect();
                    source.push_str(&class);
                    i += end + 1;
                } else {
                    source.push_str("\\[");
                }
            }
            other => source.push_str(&regex::escape(&other.to_string())),
        }
        i += 1;
    }
    source.push('$');
    // A malformed bracket expression (e.g. a reversed range) falls back to
    // matching nothing.
    Regex::new(&source)
        .unwrap_or_else(|_| Regex::new(r"[^\s\S]").expect("fallback regex is valid"))
}
