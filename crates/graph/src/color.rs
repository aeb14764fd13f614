//! Color coding of papers by first author, PI, or decade

use citagraph_common::errors::{AppError, Result};
use citagraph_common::models::decade_of;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Distinct colors handed out to authors in order of first appearance
pub const AUTHOR_COLORS: [Rgb; 20] = [
    Rgb(255, 99, 71),   // tomato
    Rgb(34, 139, 34),   // forest green
    Rgb(30, 144, 255),  // dodger blue
    Rgb(255, 215, 0),   // gold
    Rgb(138, 43, 226),  // blue violet
    Rgb(255, 105, 180), // hot pink
    Rgb(0, 128, 128),   // teal
    Rgb(255, 140, 0),   // dark orange
    Rgb(147, 112, 219), // medium purple
    Rgb(0, 100, 0),     // dark green
    Rgb(205, 92, 92),   // indian red
    Rgb(70, 130, 180),  // steel blue
    Rgb(218, 112, 214), // orchid
    Rgb(0, 139, 139),   // dark cyan
    Rgb(255, 69, 0),    // red orange
    Rgb(72, 61, 139),   // dark slate blue
    Rgb(184, 134, 11),  // dark goldenrod
    Rgb(139, 69, 19),   // saddle brown
    Rgb(47, 79, 79),    // dark slate gray
    Rgb(199, 21, 133),  // medium violet red
];

/// Color of papers without a usable year
pub const UNKNOWN_DECADE_COLOR: Rgb = Rgb(128, 128, 128);

/// Per-channel shift applied each time the author palette wraps around
const PALETTE_SHIFT: usize = 30;

/// An RGB color, rendered as `rgb(r, g, b)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Which attribute drives node colors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    #[default]
    FirstAuthor,
    Pi,
    Decade,
}

impl ColorMode {
    pub const ALL: [ColorMode; 3] = [ColorMode::FirstAuthor, ColorMode::Pi, ColorMode::Decade];

    pub fn as_str(self) -> &'static str {
        match self {
            ColorMode::FirstAuthor => "first-author",
            ColorMode::Pi => "pi",
            ColorMode::Decade => "decade",
        }
    }

    /// Human label for controls and legends
    pub fn label(self) -> &'static str {
        match self {
            ColorMode::FirstAuthor => "First Author",
            ColorMode::Pi => "Principal Investigator",
            ColorMode::Decade => "Decade",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        ColorMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s) || mode.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::Validation {
                message: format!("Unknown color mode '{}', expected first-author, pi or decade", s),
                field: Some("color".to_string()),
            })
    }
}

/// Assigns each distinct name its own color, in order of first appearance
#[derive(Debug, Default)]
pub struct AuthorPalette {
    assigned: HashMap<String, Rgb>,
}

impl AuthorPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color for `name`, assigning one on first sight.
    ///
    /// The first unused palette entry is taken; once all are in use, the
    /// color is `AUTHOR_COLORS[n % 20]` with every channel shifted by
    /// `30 * (n / 20)` modulo 256, where `n` counts names already assigned.
    pub fn color_for(&mut self, name: &str) -> Rgb {
        if let Some(&color) = self.assigned.get(name) {
            return color;
        }

        let color = AUTHOR_COLORS
            .iter()
            .copied()
            .find(|c| !self.assigned.values().any(|used| used == c))
            .unwrap_or_else(|| {
                let n = self.assigned.len();
                let base = AUTHOR_COLORS[n % AUTHOR_COLORS.len()];
                let shift = PALETTE_SHIFT * (n / AUTHOR_COLORS.len());
                let channel = |v: u8| ((v as usize + shift) % 256) as u8;
                Rgb(channel(base.0), channel(base.1), channel(base.2))
            });

        self.assigned.insert(name.to_string(), color);
        color
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// Rainbow from red (1960s) to violet (2020s); everything else is gray
pub fn decade_color(decade: Option<i32>) -> Rgb {
    match decade {
        Some(1960) => Rgb(255, 0, 0),
        Some(1970) => Rgb(255, 127, 0),
        Some(1980) => Rgb(255, 255, 0),
        Some(1990) => Rgb(0, 255, 0),
        Some(2000) => Rgb(0, 0, 255),
        Some(2010) => Rgb(75, 0, 130),
        Some(2020) => Rgb(148, 0, 211),
        Some(2030) => Rgb(200, 0, 255),
        _ => UNKNOWN_DECADE_COLOR,
    }
}

/// Color for a textual year
pub fn year_color(year: &str) -> Rgb {
    decade_color(decade_of(year))
}

/// Legend label of a decade: `"1990s"` or `"Unknown"`
pub fn decade_label(decade: Option<i32>) -> String {
    match decade {
        Some(d) => format!("{}s", d),
        None => citagraph_common::models::UNKNOWN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_display() {
        assert_eq!(Rgb(1, 22, 255).to_string(), "rgb(1, 22, 255)");
        assert_eq!(serde_json::to_string(&Rgb(0, 0, 0)).unwrap(), r#""rgb(0, 0, 0)""#);
    }

    #[test]
    fn test_decade_colors() {
        assert_eq!(year_color("1965"), Rgb(255, 0, 0));
        assert_eq!(year_color("1999"), Rgb(0, 255, 0));
        assert_eq!(year_color("2021"), Rgb(148, 0, 211));
        assert_eq!(year_color("2035"), Rgb(200, 0, 255));
        assert_eq!(year_color("1955"), UNKNOWN_DECADE_COLOR);
        assert_eq!(year_color("Unknown"), UNKNOWN_DECADE_COLOR);
        assert_eq!(year_color(""), UNKNOWN_DECADE_COLOR);
    }

    #[test]
    fn test_decade_label() {
        assert_eq!(decade_label(Some(1990)), "1990s");
        assert_eq!(decade_label(None), "Unknown");
    }

    #[test]
    fn test_palette_first_appearance_order() {
        let mut palette = AuthorPalette::new();
        assert_eq!(palette.color_for("Curie"), AUTHOR_COLORS[0]);
        assert_eq!(palette.color_for("Bohr"), AUTHOR_COLORS[1]);
        assert_eq!(palette.color_for("Curie"), AUTHOR_COLORS[0]);
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn test_palette_wraps_with_shift() {
        let mut palette = AuthorPalette::new();
        for i in 0..20 {
            assert_eq!(palette.color_for(&format!("a{}", i)), AUTHOR_COLORS[i]);
        }

        // 21st author: base tomato shifted by 30 in each channel
        assert_eq!(palette.color_for("a20"), Rgb(29, 129, 101));
        // 22nd: forest green shifted by 30
        assert_eq!(palette.color_for("a21"), Rgb(64, 169, 64));
    }

    #[test]
    fn test_parse_color_mode() {
        assert_eq!("pi".parse::<ColorMode>().unwrap(), ColorMode::Pi);
        assert_eq!("First Author".parse::<ColorMode>().unwrap(), ColorMode::FirstAuthor);
        assert_eq!("DECADE".parse::<ColorMode>().unwrap(), ColorMode::Decade);
        assert!("journal".parse::<ColorMode>().is_err());
    }
}
