//! Swipe Color
//!
//! Per-item visual marker stored as a hex string, and the drag gesture
//! that changes it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult};

/// Drag distance (logical px) a swipe must exceed to recolor
pub const DEFAULT_SWIPE_THRESHOLD: f32 = 100.0;

/// Hex color, `#RRGGBB` or `#AARRGGBB`, upper case
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SwipeColor(String);

impl SwipeColor {
    /// Pale blue every new item starts with
    pub const DEFAULT_HEX: &'static str = "#B7E0FF";
    pub const RIGHT_SWIPE_HEX: &'static str = "#C8F7C5";
    pub const LEFT_SWIPE_HEX: &'static str = "#FFC9C9";

    pub fn parse(s: &str) -> DomainResult<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| DomainError::InvalidInput(format!("color must start with '#': {}", s)))?;

        if !(digits.len() == 6 || digits.len() == 8) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidInput(format!("not a hex color: {}", s)));
        }
        Ok(Self(format!("#{}", digits.to_ascii_uppercase())))
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(format!("#{:02X}{:02X}{:02X}", r, g, b))
    }

    pub fn from_argb(argb: u32) -> Self {
        Self(format!("#{:08X}", argb))
    }

    /// Red, green, blue components (alpha ignored)
    pub fn rgb(&self) -> (u8, u8, u8) {
        let digits = &self.0[1..];
        let offset = digits.len() - 6;
        let channel = |i: usize| u8::from_str_radix(&digits[offset + i..offset + i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }

    /// Alpha channel, 0xFF when the color has none
    pub fn alpha(&self) -> u8 {
        if self.0.len() == 9 {
            u8::from_str_radix(&self.0[1..3], 16).unwrap_or(0xFF)
        } else {
            0xFF
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SwipeColor {
    fn default() -> Self {
        Self(Self::DEFAULT_HEX.to_string())
    }
}

impl fmt::Display for SwipeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SwipeColor {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SwipeColor> for String {
    fn from(color: SwipeColor) -> Self {
        color.0
    }
}

/// Horizontal drag that crossed the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeGesture {
    Left,
    Right,
}

impl SwipeGesture {
    /// Classify a drag offset; `None` while inside the threshold
    pub fn from_offset(offset: f32, threshold: f32) -> Option<Self> {
        let threshold = threshold.abs();
        if offset > threshold {
            Some(SwipeGesture::Right)
        } else if offset < -threshold {
            Some(SwipeGesture::Left)
        } else {
            None
        }
    }

    pub fn color(&self) -> SwipeColor {
        match self {
            SwipeGesture::Right => SwipeColor(SwipeColor::RIGHT_SWIPE_HEX.to_string()),
            SwipeGesture::Left => SwipeColor(SwipeColor::LEFT_SWIPE_HEX.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_pale_blue() {
        assert_eq!(SwipeColor::default().as_str(), "#B7E0FF");
    }

    #[test]
    fn test_parse_normalizes_case() {
        let color = SwipeColor::parse("#b7e0ff").unwrap();
        assert_eq!(color.as_str(), "#B7E0FF");
        assert_eq!(color.rgb(), (0xB7, 0xE0, 0xFF));
        assert_eq!(color.alpha(), 0xFF);
    }

    #[test]
    fn test_parse_argb() {
        let color = SwipeColor::parse("#00FFFFFF").unwrap();
        assert_eq!(color.alpha(), 0);
        assert_eq!(color.rgb(), (0xFF, 0xFF, 0xFF));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SwipeColor::parse("B7E0FF").is_err());
        assert!(SwipeColor::parse("#B7E0F").is_err());
        assert!(SwipeColor::parse("#GGGGGG").is_err());
    }

    #[test]
    fn test_from_rgb() {
        assert_eq!(SwipeColor::from_rgb(200, 247, 197).as_str(), "#C8F7C5");
        assert_eq!(SwipeColor::from_argb(0xFF00_80FF).as_str(), "#FF0080FF");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&SwipeColor::default()).unwrap();
        assert_eq!(json, "\"#B7E0FF\"");
        let back: SwipeColor = serde_json::from_str("\"#c8f7c5\"").unwrap();
        assert_eq!(back.as_str(), "#C8F7C5");
        assert!(serde_json::from_str::<SwipeColor>("\"blue\"").is_err());
    }

    #[test]
    fn test_gesture_threshold() {
        assert_eq!(SwipeGesture::from_offset(150.0, 100.0), Some(SwipeGesture::Right));
        assert_eq!(SwipeGesture::from_offset(-150.0, 100.0), Some(SwipeGesture::Left));
        assert_eq!(SwipeGesture::from_offset(100.0, 100.0), None);
        assert_eq!(SwipeGesture::from_offset(-20.0, 100.0), None);
    }

    #[test]
    fn test_gesture_colors_differ() {
        assert_ne!(SwipeGesture::Left.color(), SwipeGesture::Right.color());
        assert_eq!(SwipeGesture::Right.color().as_str(), SwipeColor::RIGHT_SWIPE_HEX);
    }
}
