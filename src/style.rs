/*!
 * Subtitle style values.
 *
 * A `SubtitleStyle` carries everything the burn step needs to render one track:
 * font, size, colors, outline, shadow, screen position and margins. Styles are
 * plain values; they are edited one setting at a time (the CLI counterpart of a
 * settings dialog) and validated before use.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::StyleError;

/// RGB color with an ASS-style alpha (0 = opaque, 255 = fully transparent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    /// Opaque color from components
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, alpha: 0 }
    }

    /// `&HAABBGGRR`, the form used in ASS style lines
    pub fn to_ass(&self) -> String {
        format!("&H{:02X}{:02X}{:02X}{:02X}", self.alpha, self.b, self.g, self.r)
    }

    /// Inline primary color override, e.g. `{\c&H00FFFF&}` for yellow
    pub fn to_ass_override(&self) -> String {
        format!("{{\\c&H{:02X}{:02X}{:02X}&}}", self.b, self.g, self.r)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.alpha != 0 {
            write!(f, "{:02X}", self.alpha)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let named = match trimmed.to_lowercase().as_str() {
            "white" => Some(Color::WHITE),
            "black" => Some(Color::BLACK),
            "yellow" => Some(Color::rgb(255, 255, 0)),
            "red" => Some(Color::rgb(255, 0, 0)),
            "green" => Some(Color::rgb(0, 255, 0)),
            "blue" => Some(Color::rgb(0, 0, 255)),
            "cyan" => Some(Color::rgb(0, 255, 255)),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let invalid = || StyleError::InvalidValue {
            field: "color",
            value: s.to_string(),
        };

        let hex = trimmed.strip_prefix('#').ok_or_else(invalid)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Color {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            alpha: if hex.len() == 8 { byte(6)? } else { 0 },
        })
    }
}

impl TryFrom<String> for Color {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Numpad-style screen position used by ASS (1-3 bottom, 4-6 middle, 7-9 top)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Alignment(u8);

impl Alignment {
    pub const BOTTOM: Alignment = Alignment(2);
    pub const MIDDLE: Alignment = Alignment(5);
    pub const TOP: Alignment = Alignment(8);

    pub fn new(value: u8) -> Result<Self, StyleError> {
        if (1..=9).contains(&value) {
            Ok(Alignment(value))
        } else {
            Err(StyleError::OutOfRange {
                field: "alignment",
                min: 1.0,
                max: 9.0,
                value: value as f64,
            })
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_top(&self) -> bool {
        self.0 >= 7
    }

    pub fn is_middle(&self) -> bool {
        (4..=6).contains(&self.0)
    }

    pub fn is_bottom(&self) -> bool {
        self.0 <= 3
    }

    /// Column: 0 left, 1 center, 2 right
    pub fn column(&self) -> u8 {
        (self.0 - 1) % 3
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Alignment::BOTTOM
    }
}

impl TryFrom<u8> for Alignment {
    type Error = StyleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Alignment::new(value)
    }
}

impl From<Alignment> for u8 {
    fn from(alignment: Alignment) -> Self {
        alignment.0
    }
}

impl FromStr for Alignment {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bottom" => Ok(Alignment::BOTTOM),
            "middle" | "center" => Ok(Alignment::MIDDLE),
            "top" => Ok(Alignment::TOP),
            other => {
                let value: u8 = other.parse().map_err(|_| StyleError::InvalidValue {
                    field: "alignment",
                    value: s.to_string(),
                })?;
                Alignment::new(value)
            }
        }
    }
}

/// Style of one subtitle track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleStyle {
    /// Font family
    pub font_name: String,

    /// Font size in script pixels
    pub font_size: u32,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    /// Text color
    pub primary_color: Color,

    /// Outline color
    pub outline_color: Color,

    /// Shadow / box color
    #[serde(default = "default_back_color")]
    pub back_color: Color,

    /// Outline thickness, 0 disables the outline
    pub outline: f32,

    #[serde(default)]
    pub shadow: f32,

    /// 1 = outline + shadow, 3 = opaque box
    #[serde(default = "default_border_style")]
    pub border_style: u8,

    #[serde(default)]
    pub alignment: Alignment,

    #[serde(default = "default_side_margin")]
    pub margin_l: u32,

    #[serde(default = "default_side_margin")]
    pub margin_r: u32,

    /// Vertical margin (distance from the bottom edge for bottom-aligned text)
    pub margin_v: u32,
}

fn default_back_color() -> Color {
    Color::BLACK
}

fn default_border_style() -> u8 {
    1
}

fn default_side_margin() -> u32 {
    10
}

const MAX_FONT_SIZE: u32 = 500;
const MAX_OUTLINE: f32 = 10.0;
const MAX_MARGIN: u32 = 1000;

impl SubtitleStyle {
    /// Upper track: CJK serif font, small, sits above the second track
    pub fn first_track_default() -> Self {
        Self {
            font_name: "SimSun".to_string(),
            font_size: 12,
            ..Self::base()
        }
    }

    /// Lower track: latin sans font, larger, close to the bottom edge
    pub fn second_track_default() -> Self {
        Self {
            font_name: "Gotham Medium".to_string(),
            font_size: 16,
            margin_v: 5,
            ..Self::base()
        }
    }

    fn base() -> Self {
        Self {
            font_name: "Arial".to_string(),
            font_size: 16,
            bold: false,
            italic: false,
            primary_color: Color::WHITE,
            outline_color: Color::BLACK,
            back_color: default_back_color(),
            outline: 0.5,
            shadow: 0.0,
            border_style: default_border_style(),
            alignment: Alignment::BOTTOM,
            margin_l: default_side_margin(),
            margin_r: default_side_margin(),
            margin_v: 35,
        }
    }

    /// Apply a single `key=value` edit.
    ///
    /// Recognised keys: `font`, `size`, `color`, `outline`, `outline-color`,
    /// `shadow`, `margin`, `margin-l`, `margin-r`, `align`, `bold`, `italic`.
    /// `outline=off` disables the outline; `outline=on` restores a thickness of 0.5
    /// when it was disabled. The style is left unchanged when the edit fails.
    pub fn apply_setting(&mut self, key: &str, value: &str) -> Result<(), StyleError> {
        let mut updated = self.clone();
        updated.set_field(key, value.trim())?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn set_field(&mut self, key: &str, value: &str) -> Result<(), StyleError> {
        match key.trim().to_lowercase().replace('_', "-").as_str() {
            "font" | "font-name" => {
                if value.is_empty() {
                    return Err(StyleError::EmptyFont);
                }
                self.font_name = value.to_string();
            }
            "size" | "font-size" => {
                self.font_size = parse_number::<u32>("font size", value)?;
            }
            "color" | "colour" | "primary-color" => {
                self.primary_color = value.parse()?;
            }
            "outline-color" | "outline-colour" => {
                self.outline_color = value.parse()?;
            }
            "back-color" | "back-colour" => {
                self.back_color = value.parse()?;
            }
            "outline" => match value.to_lowercase().as_str() {
                "off" | "none" | "false" => self.outline = 0.0,
                "on" | "true" => {
                    if self.outline <= 0.0 {
                        self.outline = 0.5;
                    }
                }
                _ => self.outline = parse_number::<f32>("outline", value)?,
            },
            "shadow" => {
                self.shadow = parse_number::<f32>("shadow", value)?;
            }
            "margin" | "margin-v" => {
                self.margin_v = parse_number::<u32>("margin", value)?;
            }
            "margin-l" => {
                self.margin_l = parse_number::<u32>("left margin", value)?;
            }
            "margin-r" => {
                self.margin_r = parse_number::<u32>("right margin", value)?;
            }
            "align" | "alignment" | "position" => {
                self.alignment = value.parse()?;
            }
            "box" | "border-style" => {
                self.border_style = match value.to_lowercase().as_str() {
                    "on" | "true" | "3" => 3,
                    "off" | "false" | "1" => 1,
                    _ => {
                        return Err(StyleError::InvalidValue {
                            field: "border style",
                            value: value.to_string(),
                        })
                    }
                };
            }
            "bold" => self.bold = parse_flag("bold", value)?,
            "italic" => self.italic = parse_flag("italic", value)?,
            other => return Err(StyleError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }

    /// Check numeric ranges and identifiers
    pub fn validate(&self) -> Result<(), StyleError> {
        if self.font_name.trim().is_empty() {
            return Err(StyleError::EmptyFont);
        }
        // Commas separate the fields of an ASS style line
        if self.font_name.contains(',') {
            return Err(StyleError::InvalidValue {
                field: "font name",
                value: self.font_name.clone(),
            });
        }
        check_range("font size", self.font_size as f64, 1.0, MAX_FONT_SIZE as f64)?;
        check_range("outline", self.outline as f64, 0.0, MAX_OUTLINE as f64)?;
        check_range("shadow", self.shadow as f64, 0.0, MAX_OUTLINE as f64)?;
        check_range("margin", self.margin_v as f64, 0.0, MAX_MARGIN as f64)?;
        check_range("left margin", self.margin_l as f64, 0.0, MAX_MARGIN as f64)?;
        check_range("right margin", self.margin_r as f64, 0.0, MAX_MARGIN as f64)?;
        if self.border_style != 1 && self.border_style != 3 {
            return Err(StyleError::InvalidValue {
                field: "border style",
                value: self.border_style.to_string(),
            });
        }
        Alignment::new(self.alignment.value())?;
        Ok(())
    }

    /// `Style:` line in the V4+ Styles format
    pub fn to_ass_style_line(&self, name: &str) -> String {
        let flag = |b: bool| if b { -1 } else { 0 };
        format!(
            "Style: {name},{font},{size},{primary},&H000000FF,{outline_c},{back},{bold},{italic},0,0,100,100,0,0,{border},{outline},{shadow},{align},{ml},{mr},{mv},1",
            name = name,
            font = self.font_name,
            size = self.font_size,
            primary = self.primary_color.to_ass(),
            outline_c = self.outline_color.to_ass(),
            back = self.back_color.to_ass(),
            bold = flag(self.bold),
            italic = flag(self.italic),
            border = self.border_style,
            outline = self.outline,
            shadow = self.shadow,
            align = self.alignment.value(),
            ml = self.margin_l,
            mr = self.margin_r,
            mv = self.margin_v,
        )
    }
}

fn parse_number<T: FromStr>(field: &'static str, value: &str) -> Result<T, StyleError> {
    value.parse::<T>().map_err(|_| StyleError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, StyleError> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(StyleError::InvalidValue {
            field,
            value: value.to_string(),
        }),
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), StyleError> {
    if value.is_nan() || value < min || value > max {
        return Err(StyleError::OutOfRange { field, min, max, value });
    }
    Ok(())
}
