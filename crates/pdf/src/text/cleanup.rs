use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const LIGATURES: [(char, &str); 5] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Clean up text extracted from a page.
///
/// NFC-normalizes, expands ligatures, drops replacement characters and
/// collapses horizontal whitespace runs. Line breaks are kept since question
/// and option markers are recognized per line; blank lines are removed.
pub fn cleanup_text(text: &str) -> String {
    let mut result: String = text.nfc().collect();

    for (ligature, replacement) in LIGATURES {
        result = result.replace(ligature, replacement);
    }

    result = result.replace('\u{FFFD}', "");

    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());

    result
        .lines()
        .map(|line| re_spaces.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        assert_eq!(cleanup_text("1. What is 2+2?"), "1. What is 2+2?");
    }

    #[test]
    fn test_ligature_fix() {
        assert_eq!(cleanup_text("\u{FB01}nd the a\u{FB04}x"), "find the afflx");
    }

    #[test]
    fn test_replacement_char_removed() {
        assert_eq!(cleanup_text("A.\u{FFFD} Paris"), "A. Paris");
    }

    #[test]
    fn test_whitespace_runs_collapsed_lines_kept() {
        assert_eq!(
            cleanup_text("  1.   Capital\tof France?\n\n  A.  Paris  "),
            "1. Capital of France?\nA. Paris"
        );
    }

    #[test]
    fn test_nfc_normalization() {
        assert_eq!(cleanup_text("caf\u{0065}\u{0301}"), "caf\u{00E9}");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(cleanup_text("  \n \n"), "");
    }
}
