//! Lexical correction of raw model output.
//!
//! The Akan checkpoint reliably garbles a handful of domain words; this pass
//! fixes them with a fixed substitution table. It runs on whitespace tokens,
//! matches case-insensitively, and leaves everything else untouched.

/// Fixed correction table: lowercase source token → replacement.
///
/// Compile-time constant; there is no runtime mechanism for extending it.
const CORRECTIONS: &[(&str, &str)] = &[
    ("akan", "Akan"),
    ("akn", "Akan"),
    ("spch", "speech"),
    ("imprd", "impaired"),
];

/// Apply the correction table to a raw transcription.
///
/// Pure function: splits on whitespace, substitutes known tokens, rejoins
/// with single spaces. Tokens not in the table keep their original casing.
pub fn correct(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            CORRECTIONS
                .iter()
                .find(|(from, _)| *from == lower)
                .map_or(word, |(_, to)| *to)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tokens_are_replaced() {
        assert_eq!(correct("akan akn spch imprd"), "Akan Akan speech impaired");
    }

    #[test]
    fn test_case_insensitive_matching() {
        assert_eq!(correct("AKAN"), "Akan");
        assert_eq!(correct("Spch IMPRD"), "speech impaired");
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        assert_eq!(correct("hello world"), "hello world");
        assert_eq!(correct("Hello World"), "Hello World");
    }

    #[test]
    fn test_idempotent() {
        let once = correct("akan akn spch imprd hello");
        let twice = correct(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_whitespace_collapses_to_single_spaces() {
        assert_eq!(correct("  akan \t spch \n"), "Akan speech");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(correct(""), "");
        assert_eq!(correct("   "), "");
    }
}
