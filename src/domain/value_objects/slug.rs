//! URL slugs for categories and products.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum slug length accepted by the `slug` columns.
pub const MAX_SLUG_LENGTH: usize = 200;

/// A lowercase, hyphen-separated ASCII identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Build a slug from arbitrary text (usually a display name).
    ///
    /// Returns `None` when nothing slug-worthy remains after folding.
    pub fn from_text(text: &str) -> Option<Self> {
        let mut out = String::with_capacity(text.len());
        let mut pending_dash = false;

        for ch in text.chars() {
            match fold_char(ch) {
                Some(folded) => {
                    if pending_dash && !out.is_empty() {
                        out.push('-');
                    }
                    pending_dash = false;
                    out.push_str(folded);
                }
                None => pending_dash = true,
            }
        }

        if out.len() > MAX_SLUG_LENGTH {
            out.truncate(MAX_SLUG_LENGTH);
            while out.ends_with('-') {
                out.pop();
            }
        }

        if out.is_empty() {
            None
        } else {
            Some(Self(out))
        }
    }

    /// Accept a caller-provided slug only if it is already canonical.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::from_text(raw).filter(|slug| slug.0 == raw)
    }

    /// The n-th deduplicated variant: `roses`, `roses-2`, `roses-3`, ...
    ///
    /// The base is shortened so the result still fits `MAX_SLUG_LENGTH`.
    pub fn with_suffix(&self, n: u32) -> Self {
        if n <= 1 {
            return self.clone();
        }
        let suffix = format!("-{}", n);
        let mut base = self.0.clone();
        base.truncate(MAX_SLUG_LENGTH.saturating_sub(suffix.len()));
        while base.ends_with('-') {
            base.pop();
        }
        base.push_str(&suffix);
        Self(base)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map one character to its slug form; `None` means separator.
fn fold_char(ch: char) -> Option<&'static str> {
    const ASCII: [&str; 36] = [
        "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "a", "b", "c", "d", "e", "f", "g", "h",
        "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
    ];

    if ch.is_ascii_alphanumeric() {
        let lower = ch.to_ascii_lowercase();
        let idx = lower.to_digit(36)? as usize;
        return ASCII.get(idx).copied();
    }

    let folded = match ch {
        'ç' | 'Ç' | 'ć' | 'č' => "c",
        'ğ' | 'Ğ' => "g",
        'ı' | 'İ' | 'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Î' => "i",
        'ö' | 'Ö' | 'ó' | 'ò' | 'ô' | 'õ' | 'ø' | 'Ó' | 'Ô' => "o",
        'ş' | 'Ş' | 'ś' | 'š' => "s",
        'ü' | 'Ü' | 'ú' | 'ù' | 'û' | 'Ú' | 'Û' => "u",
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'Á' | 'Â' | 'Ä' => "a",
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'Ê' => "e",
        'ñ' | 'Ñ' => "n",
        'ß' => "ss",
        'æ' | 'Æ' => "ae",
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Red Roses", "red-roses")]
    #[test_case("  Spring -- Bouquet!  ", "spring-bouquet")]
    #[test_case("Çiçek Sepeti", "cicek-sepeti")]
    #[test_case("Gül & Orkide Aranjmanı", "gul-orkide-aranjmani")]
    #[test_case("Pfingstrosen Größe XL", "pfingstrosen-grosse-xl")]
    #[test_case("Bouquet 12", "bouquet-12")]
    fn test_from_text(input: &str, expected: &str) {
        assert_eq!(Slug::from_text(input).unwrap().as_str(), expected);
    }

    #[test]
    fn test_empty_input_has_no_slug() {
        assert!(Slug::from_text("").is_none());
        assert!(Slug::from_text("!!! ---").is_none());
    }

    #[test]
    fn test_parse_accepts_only_canonical() {
        assert!(Slug::parse("white-lilies").is_some());
        assert!(Slug::parse("White Lilies").is_none());
        assert!(Slug::parse("white--lilies").is_none());
    }

    #[test]
    fn test_with_suffix() {
        let slug = Slug::from_text("Tulips").unwrap();
        assert_eq!(slug.with_suffix(1).as_str(), "tulips");
        assert_eq!(slug.with_suffix(2).as_str(), "tulips-2");
        assert_eq!(slug.with_suffix(7).as_str(), "tulips-7");
    }

    #[test]
    fn test_suffix_keeps_long_slug_within_limit() {
        let slug = Slug::from_text(&"a".repeat(MAX_SLUG_LENGTH)).unwrap();
        assert_eq!(slug.as_str().len(), MAX_SLUG_LENGTH);

        let second = slug.with_suffix(2);
        assert_eq!(second.as_str().len(), MAX_SLUG_LENGTH);
        assert!(second.as_str().ends_with("a-2"));

        let hyphenated = Slug::from_text(&format!("{}-b", "a".repeat(197))).unwrap();
        let bumped = hyphenated.with_suffix(12);
        assert!(bumped.as_str().len() <= MAX_SLUG_LENGTH);
        assert!(!bumped.as_str().contains("--"));
    }

    #[test]
    fn test_truncates_long_names() {
        let long = "a ".repeat(300);
        let slug = Slug::from_text(&long).unwrap();
        assert!(slug.as_str().len() <= MAX_SLUG_LENGTH);
        assert!(!slug.as_str().ends_with('-'));
    }
}
