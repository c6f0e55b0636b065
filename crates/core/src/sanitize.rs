#![forbid(unsafe_code)]

//! Error-message sanitization.
//!
//! Every user-visible error message passes through here: first line only,
//! SQL fragments redacted, absolute path tokens elided, length capped.

const SQL_KEYWORDS: [&str; 4] = ["select", "insert", "update", "delete"];
const TOKEN_TRIM: &[char] = &['.', ',', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\''];
const MAX_MESSAGE_CHARS: usize = 200;

pub fn sanitize_error_message(raw: &str) -> String {
    let mut message = raw.lines().next().unwrap_or("").trim().to_string();
    message = redact_sql(&message);
    message = redact_path_tokens(&message);
    truncate_chars(&message, MAX_MESSAGE_CHARS)
}

/// Replaces everything from the first SQL keyword (word-boundary match,
/// case-insensitive) with `[SQL query]`. ASCII lowering keeps byte offsets
/// stable for the slice back into the original message.
fn redact_sql(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    let mut cut: Option<usize> = None;
    for keyword in SQL_KEYWORDS {
        let mut search = 0;
        while let Some(pos) = lower[search..].find(keyword) {
            let start = search + pos;
            let end = start + keyword.len();
            if is_word_boundary(&lower, start, end) {
                cut = Some(cut.map_or(start, |existing| existing.min(start)));
                break;
            }
            search = end;
        }
    }
    match cut {
        Some(start) => {
            let mut out = message[..start].to_string();
            out.push_str("[SQL query]");
            out
        }
        None => message.to_string(),
    }
}

fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before_ok = start == 0
        || text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric() && c != '_');
    let after_ok = end >= text.len()
        || text[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric() && c != '_');
    before_ok && after_ok
}

/// Replaces absolute POSIX (`/…`) and Windows (`C:\…`) path tokens with
/// `[path]`, keeping surrounding punctuation.
fn redact_path_tokens(message: &str) -> String {
    message
        .split(' ')
        .map(|token| {
            let stripped = token.trim_matches(TOKEN_TRIM);
            if !stripped.is_empty() && (stripped.starts_with('/') || is_windows_path(stripped)) {
                token.replacen(stripped, "[path]", 1)
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_windows_path(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(drive), Some(':'), Some('\\')) if drive.is_ascii_alphabetic()
    )
}

fn truncate_chars(message: &str, limit: usize) -> String {
    if message.chars().count() <= limit {
        return message.to_string();
    }
    let mut out: String = message.chars().take(limit.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
