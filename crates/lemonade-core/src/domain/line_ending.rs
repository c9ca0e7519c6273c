//! Line-ending normalisation for clipboard text.
//!
//! Text pasted from a Windows desktop arrives with `\r\n`; text copied from a
//! classic Mac editor may contain lone `\r`.  The `--line-ending` option picks
//! one convention and every line break is rewritten to it.
//!
//! The conversion is a single forward scan.  Each break is classified as
//! `\r\n`, a lone `\r` or a lone `\n` and emitted in the target form, so
//! converting twice gives the same text as converting once.

/// Target line-ending convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// Unix style: `\n`.
    Lf,
    /// Windows style: `\r\n`.
    Crlf,
}

impl LineEnding {
    /// Parses the `--line-ending` option value.
    ///
    /// Only `lf`, `LF`, `crlf` and `CRLF` are recognised.  Anything else
    /// (including the empty string) means "leave text untouched" and yields
    /// `None`.
    pub fn from_option(option: &str) -> Option<Self> {
        match option {
            "lf" | "LF" => Some(LineEnding::Lf),
            "crlf" | "CRLF" => Some(LineEnding::Crlf),
            _ => None,
        }
    }

    /// The byte sequence that terminates a line in this convention.
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }

    /// Rewrites every line break in `text` to this convention.
    pub fn normalize(self, text: &str) -> String {
        let eol = self.as_str();
        let mut out = String::with_capacity(text.len() + text.len() / 16);
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\r' => {
                    // `\r\n` is one break, not two.
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    out.push_str(eol);
                }
                '\n' => out.push_str(eol),
                other => out.push(other),
            }
        }
        out
    }
}

/// Converts the line endings of `text` according to the raw option string.
///
/// Unknown options return `text` unchanged.
///
/// # Examples
///
/// ```rust
/// use lemonade_core::convert_line_ending;
///
/// assert_eq!(convert_line_ending("a\r\nb\rc", "lf"), "a\nb\nc");
/// assert_eq!(convert_line_ending("a\nb", "crlf"), "a\r\nb");
/// assert_eq!(convert_line_ending("a\r\nb", ""), "a\r\nb");
/// ```
pub fn convert_line_ending(text: &str, option: &str) -> String {
    match LineEnding::from_option(option) {
        Some(ending) => ending.normalize(text),
        None => text.to_owned(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "plain",
        "\n",
        "\r",
        "\r\n",
        "\n\r",
        "\r\r\n\n",
        "a\nb\nc",
        "a\r\nb\r\nc\r\n",
        "a\rb\rc\r",
        "mixed\r\nline\nendings\rhere",
        "\n\nleading and trailing\r\r",
        "unicode ✓\r\nテキスト\r",
    ];

    #[test]
    fn test_lf_rewrites_crlf_and_lone_cr() {
        assert_eq!(convert_line_ending("a\r\nb\rc\nd", "lf"), "a\nb\nc\nd");
    }

    #[test]
    fn test_lf_output_never_contains_cr() {
        for sample in SAMPLES {
            let converted = convert_line_ending(sample, "lf");
            assert!(!converted.contains('\r'), "CR left in {converted:?}");
        }
    }

    #[test]
    fn test_crlf_adds_missing_halves_without_doubling() {
        assert_eq!(convert_line_ending("a\nb\r\nc\rd", "crlf"), "a\r\nb\r\nc\r\nd");
    }

    #[test]
    fn test_crlf_handles_break_at_start_and_end() {
        assert_eq!(convert_line_ending("\nx\r", "crlf"), "\r\nx\r\n");
    }

    #[test]
    fn test_crlf_converts_consecutive_lone_breaks() {
        // Each lone break becomes its own CRLF.
        assert_eq!(convert_line_ending("\n\n", "crlf"), "\r\n\r\n");
        assert_eq!(convert_line_ending("\r\r", "crlf"), "\r\n\r\n");
        assert_eq!(convert_line_ending("\n\r", "crlf"), "\r\n\r\n");
    }

    #[test]
    fn test_crlf_is_idempotent() {
        for sample in SAMPLES {
            let once = convert_line_ending(sample, "crlf");
            let twice = convert_line_ending(&once, "crlf");
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_lf_is_idempotent() {
        for sample in SAMPLES {
            let once = convert_line_ending(sample, "LF");
            assert_eq!(convert_line_ending(&once, "LF"), once);
        }
    }

    #[test]
    fn test_unknown_modes_are_identity() {
        for mode in ["", "cr", "Lf", "crLF", "unix", "windows"] {
            for sample in SAMPLES {
                assert_eq!(convert_line_ending(sample, mode), *sample);
            }
        }
    }

    #[test]
    fn test_uppercase_modes_are_recognised() {
        assert_eq!(LineEnding::from_option("LF"), Some(LineEnding::Lf));
        assert_eq!(LineEnding::from_option("CRLF"), Some(LineEnding::Crlf));
    }

    #[test]
    fn test_non_break_characters_are_preserved() {
        let text = "tab\there \u{2028} 🍋";
        assert_eq!(LineEnding::Crlf.normalize(text), text);
        assert_eq!(LineEnding::Lf.normalize(text), text);
    }
}
