//! PNG QR renderer backed by the `qrcode` and `image` crates.

use image::{ImageFormat, Rgb};
use qrcode::{EcLevel, QrCode};
use serde_json::json;
use std::io::Cursor;

use crate::domain::qr::{ErrorCorrection, QrOptions, QrRenderer};
use crate::error::AppError;

/// Renders QR codes as PNG images with a fixed set of [`QrOptions`].
#[derive(Debug, Clone, Default)]
pub struct PngQrRenderer {
    options: QrOptions,
}

impl PngQrRenderer {
    pub fn new(options: QrOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &QrOptions {
        &self.options
    }
}

fn ec_level(level: ErrorCorrection) -> EcLevel {
    match level {
        ErrorCorrection::Low => EcLevel::L,
        ErrorCorrection::Medium => EcLevel::M,
        ErrorCorrection::Quartile => EcLevel::Q,
        ErrorCorrection::High => EcLevel::H,
    }
}

impl QrRenderer for PngQrRenderer {
    fn render(&self, text: &str) -> Result<Vec<u8>, AppError> {
        let code = QrCode::with_error_correction_level(
            text.as_bytes(),
            ec_level(self.options.error_correction),
        )
        .map_err(|e| {
            AppError::internal(
                "Failed to encode QR code",
                json!({ "reason": e.to_string(), "length": text.len() }),
            )
        })?;

        let image = code
            .render::<Rgb<u8>>()
            .dark_color(Rgb(self.options.dark.0))
            .light_color(Rgb(self.options.light.0))
            .quiet_zone(true)
            .min_dimensions(self.options.size, self.options.size)
            .build();

        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| {
                AppError::internal(
                    "Failed to encode QR image",
                    json!({ "reason": e.to_string() }),
                )
            })?;

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::qr::QrColor;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn decode(bytes: &[u8]) -> image::RgbImage {
        image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .unwrap()
            .to_rgb8()
    }

    #[test]
    fn test_render_produces_png() {
        let bytes = PngQrRenderer::default()
            .render("http://localhost:3000/Ab3dK9pQ")
            .unwrap();

        assert!(bytes.starts_with(&PNG_SIGNATURE));
    }

    #[test]
    fn test_render_respects_minimum_size() {
        let renderer = PngQrRenderer::new(QrOptions {
            size: 200,
            ..QrOptions::default()
        });

        let image = decode(&renderer.render("https://s.example.com/abc").unwrap());

        assert!(image.width() >= 200);
        assert!(image.height() >= 200);
    }

    #[test]
    fn test_render_uses_configured_colors() {
        let renderer = PngQrRenderer::new(QrOptions {
            dark: QrColor([10, 20, 30]),
            light: QrColor([250, 240, 230]),
            ..QrOptions::default()
        });

        let image = decode(&renderer.render("https://s.example.com/abc").unwrap());

        // The quiet zone in the corner is always the light color.
        assert_eq!(image.get_pixel(0, 0).0, [250, 240, 230]);
        assert!(image.pixels().any(|p| p.0 == [10, 20, 30]));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = PngQrRenderer::default();
        let a = renderer.render("https://s.example.com/same").unwrap();
        let b = renderer.render("https://s.example.com/same").unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_render_rejects_oversized_text() {
        let renderer = PngQrRenderer::new(QrOptions {
            error_correction: ErrorCorrection::High,
            ..QrOptions::default()
        });

        let result = renderer.render(&"x".repeat(5000));

        assert!(matches!(result, Err(AppError::Internal { .. })));
    }
}
