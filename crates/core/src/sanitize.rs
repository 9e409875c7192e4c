//! Filename sanitization for download headers.
//!
//! `Content-Disposition` values must stay ASCII-safe, so served filenames
//! are NFD-decomposed, combining marks are dropped (stripping diacritics),
//! and any remaining non-ASCII or header-breaking character is replaced
//! with an underscore.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strip decomposable unicode from a filename and force it ASCII-safe.
///
/// Diacritics are removed by NFD decomposition (`é` becomes `e`);
/// characters with no ASCII base form, quotes, and control characters
/// become `_`. An empty result falls back to `"download"`.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_names_pass_through() {
        assert_eq!(sanitize_filename("example.txt"), "example.txt");
    }

    #[test]
    fn diacritics_are_stripped() {
        assert_eq!(sanitize_filename("résumé.pdf"), "resume.pdf");
        assert_eq!(sanitize_filename("příloha.txt"), "priloha.txt");
    }

    #[test]
    fn header_breaking_characters_are_replaced() {
        assert_eq!(sanitize_filename("a\"b\\c.txt"), "a_b_c.txt");
        assert_eq!(sanitize_filename("line\nbreak"), "line_break");
    }

    #[test]
    fn non_decomposable_unicode_is_replaced() {
        assert_eq!(sanitize_filename("файл.txt"), "____.txt");
    }

    #[test]
    fn empty_input_falls_back() {
        assert_eq!(sanitize_filename(""), "download");
        assert_eq!(sanitize_filename("   "), "download");
    }
}
