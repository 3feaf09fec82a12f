//! Named color table and canonical color values
//!
//! Colors written in a scene (hex literals, `rgb(r g b)`, or names like
//! `light gray`) are normalized to a single [`Color`] value so emitted SVG is
//! byte-stable. Named colors come from a [`ColorTable`], which ships with the
//! CSS color keywords and can be replaced from TOML.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a color table
#[derive(Error, Debug)]
pub enum ColorTableError {
    #[error("Failed to parse color table TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid color '{value}' for '{name}' in color table")]
    InvalidColor { name: String, value: String },
}

/// A canonical color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// No paint (`none` or `transparent`)
    None,
    Rgba { r: u8, g: u8, b: u8, a: u8 },
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgba { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`
    pub fn parse_hex(s: &str) -> Option<Color> {
        let digits = s.strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded: String = match digits.len() {
            3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => digits.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        let a = if expanded.len() == 8 { channel(6)? } else { 255 };
        Some(Color::Rgba {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::None => f.write_str("none"),
            Color::Rgba { r, g, b, a: 255 } => write!(f, "#{:02X}{:02X}{:02X}", r, g, b),
            Color::Rgba { r, g, b, a } => write!(f, "#{:02X}{:02X}{:02X}{:02X}", r, g, b, a),
        }
    }
}

/// Lookup key for a color name: lowercase with whitespace, `_` and `-` removed, so
/// `Light Gray`, `light gray` and `lightgray` are the same color
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Table of named colors, passed explicitly into the resolver
#[derive(Debug, Clone)]
pub struct ColorTable {
    /// Optional name for the table
    pub name: Option<String>,
    colors: HashMap<String, Color>,
}

/// TOML structure for deserializing color tables
#[derive(Deserialize)]
struct TomlColorTable {
    metadata: Option<TomlMetadata>,
    colors: HashMap<String, String>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
}

/// CSS color keywords
const DEFAULT_COLORS: &str = r##"
[metadata]
name = "css"

[colors]
black = "#000000"
white = "#ffffff"
red = "#ff0000"
green = "#008000"
lime = "#00ff00"
blue = "#0000ff"
yellow = "#ffff00"
cyan = "#00ffff"
aqua = "#00ffff"
magenta = "#ff00ff"
fuchsia = "#ff00ff"
orange = "#ffa500"
purple = "#800080"
pink = "#ffc0cb"
brown = "#a52a2a"
gray = "#808080"
grey = "#808080"
silver = "#c0c0c0"
gold = "#ffd700"
navy = "#000080"
teal = "#008080"
olive = "#808000"
maroon = "#800000"
indigo = "#4b0082"
violet = "#ee82ee"
coral = "#ff7f50"
salmon = "#fa8072"
tomato = "#ff6347"
crimson = "#dc143c"
khaki = "#f0e68c"
beige = "#f5f5dc"
ivory = "#fffff0"
lavender = "#e6e6fa"
turquoise = "#40e0d0"
tan = "#d2b48c"
chocolate = "#d2691e"
orchid = "#da70d6"
plum = "#dda0dd"
skyblue = "#87ceeb"
steelblue = "#4682b4"
royalblue = "#4169e1"
midnightblue = "#191970"
dodgerblue = "#1e90ff"
cornflowerblue = "#6495ed"
lightblue = "#add8e6"
darkblue = "#00008b"
lightgreen = "#90ee90"
darkgreen = "#006400"
forestgreen = "#228b22"
seagreen = "#2e8b57"
limegreen = "#32cd32"
lightgray = "#d3d3d3"
lightgrey = "#d3d3d3"
darkgray = "#a9a9a9"
darkgrey = "#a9a9a9"
dimgray = "#696969"
slategray = "#708090"
gainsboro = "#dcdcdc"
whitesmoke = "#f5f5f5"
lightyellow = "#ffffe0"
lightpink = "#ffb6c1"
hotpink = "#ff69b4"
darkred = "#8b0000"
darkorange = "#ff8c00"
orangered = "#ff4500"
lightcoral = "#f08080"
darkviolet = "#9400d3"
rebeccapurple = "#663399"
"##;

impl ColorTable {
    /// A table with no named colors
    pub fn empty() -> Self {
        ColorTable {
            name: None,
            colors: HashMap::new(),
        }
    }

    /// Load a color table from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ColorTableError> {
        let parsed: TomlColorTable = toml::from_str(content)?;

        let mut colors = HashMap::with_capacity(parsed.colors.len());
        for (name, value) in parsed.colors {
            let color = if matches!(value.as_str(), "none" | "transparent") {
                Color::None
            } else {
                Color::parse_hex(&value).ok_or_else(|| ColorTableError::InvalidColor {
                    name: name.clone(),
                    value: value.clone(),
                })?
            };
            colors.insert(normalize_name(&name), color);
        }

        Ok(ColorTable {
            name: parsed.metadata.and_then(|m| m.name),
            colors,
        })
    }

    /// Look up a named color, ignoring case and spacing
    pub fn lookup(&self, name: &str) -> Option<Color> {
        let key = normalize_name(name);
        match key.as_str() {
            "none" | "transparent" => Some(Color::None),
            _ => self.colors.get(&key).copied(),
        }
    }

    /// All color names in the table, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.colors.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        // The embedded table is covered by `test_default_table_loads`
        Self::from_str(DEFAULT_COLORS).unwrap_or_else(|_| Self::empty())
    }
}
