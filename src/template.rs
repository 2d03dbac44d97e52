//! Template style table.
//!
//! A template is a TOML document mapping style keys to style descriptors:
//!
//! ```toml
//! [body]
//! font = "Calibri"
//! size = 11
//!
//! [heading1]
//! color = "#2F5496"
//! size = 18
//! ```
//!
//! Every key is optional. Keys the template leaves out are filled in by the
//! style resolver.

use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// A 24-bit color written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `RRGGBB`.
    pub fn parse(value: &str) -> Result<Self> {
        let hex = value.strip_prefix('#').unwrap_or(value);
        let invalid = || Error::InvalidColor(value.to_string());
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: Range<usize>| u8::from_str_radix(&hex[range], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Rgb::parse(&value)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Typographic settings of one template style. Unset fields are left to the
/// renderer's defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleDescriptor {
    pub font: Option<String>,
    /// Font size in points
    pub size: Option<f32>,
    pub color: Option<Rgb>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Template {
    pub heading1: Option<StyleDescriptor>,
    pub heading2: Option<StyleDescriptor>,
    pub heading3: Option<StyleDescriptor>,
    pub heading4: Option<StyleDescriptor>,
    pub heading5: Option<StyleDescriptor>,
    pub heading6: Option<StyleDescriptor>,
    pub body: Option<StyleDescriptor>,
    pub quote: Option<StyleDescriptor>,
    pub list_bullet: Option<StyleDescriptor>,
    pub list_number: Option<StyleDescriptor>,
}

impl Template {
    /// Parse a template from the raw bytes of a template file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Get the style for a heading level.
    /// Returns None if the template does not define one.
    pub fn heading(&self, level: u8) -> Option<&StyleDescriptor> {
        match level {
            1 => self.heading1.as_ref(),
            2 => self.heading2.as_ref(),
            3 => self.heading3.as_ref(),
            4 => self.heading4.as_ref(),
            5 => self.heading5.as_ref(),
            6 => self.heading6.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_template() {
        let template = Template::from_bytes(
            br##"
            [body]
            font = "Calibri"
            size = 11

            [heading2]
            color = "#2F5496"
            bold = false
            "##,
        )
        .unwrap();

        let body = template.body.as_ref().unwrap();
        assert_eq!(body.font.as_deref(), Some("Calibri"));
        assert_eq!(body.size, Some(11.0));

        let heading = template.heading(2).unwrap();
        assert_eq!(heading.color, Some(Rgb::new(0x2F, 0x54, 0x96)));
        assert_eq!(heading.bold, Some(false));

        assert!(template.heading(1).is_none());
        assert!(template.heading(7).is_none());
        assert!(template.quote.is_none());
    }

    #[test]
    fn empty_template_has_no_styles() {
        assert_eq!(Template::from_bytes(b"").unwrap(), Template::default());
    }

    #[test]
    fn rejects_bad_colors() {
        let err = Template::from_bytes(b"[body]\ncolor = \"#12345\"\n").unwrap_err();
        assert!(err.to_string().contains("#12345"));
    }

    #[test]
    fn rejects_unknown_descriptor_fields() {
        assert!(Template::from_bytes(b"[body]\nfamily = \"Arial\"\n").is_err());
    }

    #[test]
    fn rejects_non_utf8_blob() {
        assert!(matches!(
            Template::from_bytes(&[0xff, 0xfe]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn color_round_trips_through_display() {
        let color = Rgb::parse("4a90e2").unwrap();
        assert_eq!(color.to_string(), "#4A90E2");
        assert!(Rgb::parse("#GGGGGG").is_err());
        assert!(Rgb::parse("#ééé").is_err());
    }
}
