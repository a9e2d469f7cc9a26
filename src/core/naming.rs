#![forbid(unsafe_code)]

use std::sync::OnceLock;

use regex::Regex;

/// Canonicalizes raw user input into a filesystem- and branch-safe task
/// name: trim, collapse every run outside `[A-Za-z0-9_-]` into a single
/// `-`, strip leading/trailing `-`. Total and idempotent; may return the
/// empty string, which callers must reject before any side effect.
#[must_use]
pub fn sanitize_task_name(raw: &str) -> String {
    static INVALID_RUN: OnceLock<Regex> = OnceLock::new();
    let re = INVALID_RUN
        .get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("literal pattern compiles"));

    re.replace_all(raw.trim(), "-")
        .trim_matches('-')
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_task_names() {
        let cases = [
            ("simple", "simple"),
            ("with-dash", "with-dash"),
            ("with_underscore", "with_underscore"),
            ("CamelCase", "CamelCase"),
            ("with spaces", "with-spaces"),
            ("with/slashes", "with-slashes"),
            ("special!@#chars", "special-chars"),
            ("  trimmed  ", "trimmed"),
            ("---leading-trailing---", "leading-trailing"),
            ("multiple   spaces", "multiple-spaces"),
            ("Fix Bug #42", "Fix-Bug-42"),
            ("日本語", ""),
            ("", ""),
            ("   ", ""),
            ("123", "123"),
            ("a1b2c3", "a1b2c3"),
        ];
        for (input, expected) in cases {
            assert_eq!(sanitize_task_name(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn output_alphabet_and_edges() {
        for raw in ["a b/c", "!!x!!", "日本 go", "-_-", "🎉 party 🎉"] {
            let s = sanitize_task_name(raw);
            assert!(
                s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
                "unexpected char in {s:?}"
            );
            assert!(!s.starts_with('-'), "leading dash in {s:?}");
            assert!(!s.ends_with('-'), "trailing dash in {s:?}");
        }
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in ["Fix Bug #42", "  trimmed  ", "---x---", "日本語", "ok"] {
            let once = sanitize_task_name(raw);
            assert_eq!(sanitize_task_name(&once), once);
        }
    }
}
