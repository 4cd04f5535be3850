// Squad categories (playing positions) and their stable ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Football squad positions. Every candidate belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "GKP")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl Category {
    /// All categories in stable roster order.
    pub const ALL: [Category; 4] = [
        Category::Goalkeeper,
        Category::Defender,
        Category::Midfielder,
        Category::Forward,
    ];

    /// Parse a position string into a Category.
    ///
    /// Case-insensitive. Accepts the FPL abbreviations ("GKP", "DEF", "MID",
    /// "FWD") as well as the common short and long forms.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GKP" | "GK" | "G" | "GOALKEEPER" => Some(Category::Goalkeeper),
            "DEF" | "D" | "DEFENDER" => Some(Category::Defender),
            "MID" | "M" | "MIDFIELDER" => Some(Category::Midfielder),
            "FWD" | "F" | "ST" | "FORWARD" => Some(Category::Forward),
            _ => None,
        }
    }

    /// Return the display string for this category.
    pub fn display_str(&self) -> &'static str {
        match self {
            Category::Goalkeeper => "GKP",
            Category::Defender => "DEF",
            Category::Midfielder => "MID",
            Category::Forward => "FWD",
        }
    }

    /// Deterministic ordering index for roster output.
    pub fn sort_order(&self) -> u8 {
        match self {
            Category::Goalkeeper => 0,
            Category::Defender => 1,
            Category::Midfielder => 2,
            Category::Forward => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}
