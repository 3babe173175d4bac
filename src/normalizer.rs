//! Pure text normalization shared by retrieval tokenization and quote
//! grounding. Deterministic and side-effect free: everywhere substring
//! matching happens, it happens against `normalize(..)` output.

use unicode_normalization::UnicodeNormalization;

/// Normalizes `s` per the five-step procedure:
/// NFC composition, punctuation/space folding, lowercasing, whitespace
/// collapse, trim.
///
/// `normalize(normalize(s)) == normalize(s)` for all `s`.
pub fn normalize(s: &str) -> String {
    let composed: String = s.nfc().collect();

    let mut folded = String::with_capacity(composed.len());
    for c in composed.chars() {
        match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}' => {
                folded.push('"')
            }
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => folded.push('\''),
            '\u{2013}' | '\u{2014}' | '\u{2015}' => folded.push('-'),
            '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}' => {
                folded.push(' ')
            }
            '\u{200B}'..='\u{200D}' | '\u{FEFF}' => {
                // zero-width space/joiners and BOM: drop
            }
            _ => folded.push(c),
        }
    }

    let lowered = folded.to_lowercase();

    let mut collapsed = String::with_capacity(lowered.len());
    let mut last_was_space = false;
    for c in lowered.chars() {
        let is_ws = matches!(c, ' ' | '\t' | '\n' | '\u{000C}' | '\r');
        if is_ws {
            if !last_was_space {
                collapsed.push(' ');
            }
            last_was_space = true;
        } else {
            collapsed.push(c);
            last_was_space = false;
        }
    }

    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent() {
        let samples = [
            "Hello   World\n\n",
            "\u{201C}Quoted\u{201D} \u{2014} text",
            "  leading and trailing  ",
            "MiXeD\tCaSe",
            "non\u{00A0}breaking\u{00A0}space",
        ];
        for s in samples {
            let once = normalize(s);
            let twice = normalize(&once);
            assert_eq!(once, twice, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn folds_typographic_punctuation() {
        assert_eq!(normalize("\u{201C}hello\u{201D}"), "\"hello\"");
        assert_eq!(normalize("don\u{2019}t"), "don't");
        assert_eq!(normalize("em\u{2014}dash"), "em-dash");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("a\n\n  b\t\tc"), "a b c");
    }

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(normalize("  ALL CAPS  "), "all caps");
    }

    #[test]
    fn drops_zero_width_codepoints() {
        assert_eq!(normalize("a\u{200B}b"), "ab");
    }
}
