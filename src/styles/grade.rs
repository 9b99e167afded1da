use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of color grades a job can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleGrade {
    Cinematic,
    Noir,
    Cyberpunk,
    Vintage,
    None,
}

/// Keyword table, checked top to bottom; the first hit wins
const KEYWORDS: &[(&str, StyleGrade)] = &[
    ("noir", StyleGrade::Noir),
    ("black and white", StyleGrade::Noir),
    ("cyberpunk", StyleGrade::Cyberpunk),
    ("matrix", StyleGrade::Cyberpunk),
    ("vintage", StyleGrade::Vintage),
    ("warm", StyleGrade::Vintage),
    ("cinematic", StyleGrade::Cinematic),
];

impl StyleGrade {
    pub const ALL: [StyleGrade; 5] = [
        StyleGrade::Cinematic,
        StyleGrade::Noir,
        StyleGrade::Cyberpunk,
        StyleGrade::Vintage,
        StyleGrade::None,
    ];

    /// Resolve a free-text style tag by case-insensitive substring match
    pub fn classify(tag: &str) -> StyleGrade {
        let tag = tag.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(keyword, _)| tag.contains(keyword))
            .map(|&(_, grade)| grade)
            .unwrap_or(StyleGrade::None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StyleGrade::Cinematic => "cinematic",
            StyleGrade::Noir => "noir",
            StyleGrade::Cyberpunk => "cyberpunk",
            StyleGrade::Vintage => "vintage",
            StyleGrade::None => "none",
        }
    }
}

impl fmt::Display for StyleGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StyleGrade {
    type Err = String;

    /// Exact names only; free text goes through [`StyleGrade::classify`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StyleGrade::ALL
            .iter()
            .copied()
            .find(|g| g.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown style grade '{}'", s))
    }
}
