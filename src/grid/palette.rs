use serde::{Deserialize, Serialize};

use super::ColorTag;

/// Literal colors used by the spreadsheet, and their meaning.
///
/// Matching is case-insensitive. Writing a tag always uses the first literal
/// configured for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub header: Vec<String>,
    pub advance: String,
    pub neutral: Vec<String>,
    pub fresh: String,
    pub ink: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            header: vec!["#ffa500".into(), "#ff9900".into()],
            advance: "#ff0000".into(),
            neutral: vec!["#ffffff".into(), "white".into()],
            fresh: "#00ff00".into(),
            ink: "#000000".into(),
        }
    }
}

impl Palette {
    /// Map a literal color to its tag. A missing color maps to `fallback`.
    pub fn tag(&self, literal: Option<&str>, fallback: ColorTag) -> ColorTag {
        let Some(raw) = literal else {
            return fallback;
        };
        let color = raw.trim().to_lowercase();
        if color.is_empty() {
            return fallback;
        }
        if self.header.iter().any(|h| h.eq_ignore_ascii_case(&color)) {
            ColorTag::Header
        } else if self.advance.eq_ignore_ascii_case(&color) {
            ColorTag::Advance
        } else if self.neutral.iter().any(|n| n.eq_ignore_ascii_case(&color)) {
            ColorTag::Neutral
        } else if self.fresh.eq_ignore_ascii_case(&color) {
            ColorTag::Fresh
        } else if self.ink.eq_ignore_ascii_case(&color) {
            ColorTag::Ink
        } else {
            ColorTag::Other(color)
        }
    }

    /// Literal color written for a tag.
    pub fn literal(&self, tag: &ColorTag) -> String {
        match tag {
            ColorTag::Header => first_or(&self.header, "#ffa500"),
            ColorTag::Advance => self.advance.clone(),
            ColorTag::Neutral => first_or(&self.neutral, "#ffffff"),
            ColorTag::Fresh => self.fresh.clone(),
            ColorTag::Ink => self.ink.clone(),
            ColorTag::Other(color) => color.clone(),
        }
    }
}

fn first_or(colors: &[String], fallback: &str) -> String {
    colors
        .first()
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_header_colors_collapse_to_one_tag() {
        let palette = Palette::default();
        assert_eq!(palette.tag(Some("#FFA500"), ColorTag::Neutral), ColorTag::Header);
        assert_eq!(palette.tag(Some("#ff9900"), ColorTag::Neutral), ColorTag::Header);
    }

    #[test]
    fn missing_color_uses_fallback() {
        let palette = Palette::default();
        assert_eq!(palette.tag(None, ColorTag::Ink), ColorTag::Ink);
        assert_eq!(palette.tag(Some(""), ColorTag::Neutral), ColorTag::Neutral);
    }

    #[test]
    fn unknown_color_is_kept_lowercased() {
        let palette = Palette::default();
        assert_eq!(
            palette.tag(Some("#ABCDEF"), ColorTag::Neutral),
            ColorTag::Other("#abcdef".into())
        );
    }

    #[test]
    fn literal_round_trips_through_tag() {
        let palette = Palette::default();
        for tag in [
            ColorTag::Header,
            ColorTag::Advance,
            ColorTag::Neutral,
            ColorTag::Fresh,
            ColorTag::Ink,
        ] {
            let literal = palette.literal(&tag);
            assert_eq!(palette.tag(Some(&literal), ColorTag::Other("x".into())), tag);
        }
    }
}
