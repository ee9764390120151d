//! Display lookup for color tokens
//!
//! Swatches are for presentation; bands also steer the hybrid allocation
//! strategy.

use serde::Serialize;

use super::types::Color;

/// How a color is shown to operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Swatch {
    pub display_name: &'static str,
    pub display_color: &'static str,
}

/// Popularity band of a color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    High,
    Medium,
    Rare,
}

const SWATCHES: [Swatch; 12] = [
    Swatch {
        display_name: "Red",
        display_color: "#e6194b",
    },
    Swatch {
        display_name: "Green",
        display_color: "#3cb44b",
    },
    Swatch {
        display_name: "Yellow",
        display_color: "#ffe119",
    },
    Swatch {
        display_name: "Blue",
        display_color: "#0082c8",
    },
    Swatch {
        display_name: "Orange",
        display_color: "#f58231",
    },
    Swatch {
        display_name: "Purple",
        display_color: "#911eb4",
    },
    Swatch {
        display_name: "Cyan",
        display_color: "#46f0f0",
    },
    Swatch {
        display_name: "Magenta",
        display_color: "#f032e6",
    },
    Swatch {
        display_name: "Lime",
        display_color: "#d2f53c",
    },
    Swatch {
        display_name: "Pink",
        display_color: "#fabebe",
    },
    Swatch {
        display_name: "Teal",
        display_color: "#008080",
    },
    Swatch {
        display_name: "Brown",
        display_color: "#aa6e28",
    },
];

pub fn swatch(color: Color) -> Swatch {
    SWATCHES[color.index()]
}

pub fn band(color: Color) -> Band {
    match color {
        Color::C1 | Color::C2 => Band::High,
        Color::C3 | Color::C4 | Color::C5 | Color::C6 => Band::Medium,
        _ => Band::Rare,
    }
}
