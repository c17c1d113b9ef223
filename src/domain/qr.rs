//! QR rendering contract and its options.
//!
//! The renderer is a pure function from text to image bytes as far as the
//! rest of the crate is concerned; see
//! [`crate::infrastructure::qr::PngQrRenderer`] for the implementation.

use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCorrection {
    Low,
    #[default]
    Medium,
    Quartile,
    High,
}

impl FromStr for ErrorCorrection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "L" | "LOW" => Ok(Self::Low),
            "M" | "MEDIUM" => Ok(Self::Medium),
            "Q" | "QUARTILE" => Ok(Self::Quartile),
            "H" | "HIGH" => Ok(Self::High),
            other => Err(format!(
                "unknown error correction level '{}', expected L, M, Q or H",
                other
            )),
        }
    }
}

impl fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            Self::Low => "L",
            Self::Medium => "M",
            Self::Quartile => "Q",
            Self::High => "H",
        };
        f.write_str(level)
    }
}

/// An RGB color parsed from `#RRGGBB` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrColor(pub [u8; 3]);

impl QrColor {
    pub const BLACK: QrColor = QrColor([0, 0, 0]);
    pub const WHITE: QrColor = QrColor([255, 255, 255]);
}

impl FromStr for QrColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);

        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color '{}', expected #RRGGBB", s));
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());

        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl fmt::Display for QrColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
    }
}

/// Rendering options applied to every generated QR image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrOptions {
    pub error_correction: ErrorCorrection,
    /// Minimum width and height of the image in pixels.
    pub size: u32,
    pub dark: QrColor,
    pub light: QrColor,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            error_correction: ErrorCorrection::Medium,
            size: 300,
            dark: QrColor::BLACK,
            light: QrColor::WHITE,
        }
    }
}

/// Renders text into QR image bytes.
#[cfg_attr(test, mockall::automock)]
pub trait QrRenderer: Send + Sync {
    /// Renders `text` as an image.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the text does not fit in a QR symbol
    /// or the image cannot be encoded.
    fn render(&self, text: &str) -> Result<Vec<u8>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_correction_from_str() {
        assert_eq!("L".parse::<ErrorCorrection>().unwrap(), ErrorCorrection::Low);
        assert_eq!("m".parse::<ErrorCorrection>().unwrap(), ErrorCorrection::Medium);
        assert_eq!(
            "quartile".parse::<ErrorCorrection>().unwrap(),
            ErrorCorrection::Quartile
        );
        assert_eq!("H".parse::<ErrorCorrection>().unwrap(), ErrorCorrection::High);
        assert!("X".parse::<ErrorCorrection>().is_err());
    }

    #[test]
    fn test_error_correction_display() {
        assert_eq!(ErrorCorrection::Quartile.to_string(), "Q");
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!("#000000".parse::<QrColor>().unwrap(), QrColor::BLACK);
        assert_eq!("FFFFFF".parse::<QrColor>().unwrap(), QrColor::WHITE);
        assert_eq!("#1a2B3c".parse::<QrColor>().unwrap(), QrColor([0x1a, 0x2b, 0x3c]));
    }

    #[test]
    fn test_color_rejects_invalid() {
        assert!("#FFF".parse::<QrColor>().is_err());
        assert!("#GGGGGG".parse::<QrColor>().is_err());
        assert!("".parse::<QrColor>().is_err());
    }

    #[test]
    fn test_color_display() {
        assert_eq!(QrColor([255, 16, 0]).to_string(), "#FF1000");
    }

    #[test]
    fn test_default_options() {
        let options = QrOptions::default();
        assert_eq!(options.error_correction, ErrorCorrection::Medium);
        assert_eq!(options.dark, QrColor::BLACK);
        assert_eq!(options.light, QrColor::WHITE);
    }
}
