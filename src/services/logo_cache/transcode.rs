//! Decode, colour-normalize and re-encode downloaded logos

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;

use crate::config::TranscodeConfig;
use crate::errors::FetchError;
use crate::models::LogoAssetFormat;

/// Image normalizer shared by all workers
#[derive(Debug, Clone, Copy)]
pub struct LogoTranscoder {
    format: LogoAssetFormat,
    quality: u8,
}

impl LogoTranscoder {
    pub fn new(format: LogoAssetFormat, quality: u8) -> Self {
        Self {
            format,
            quality: quality.clamp(1, 100),
        }
    }

    pub fn format(&self) -> LogoAssetFormat {
        self.format
    }

    /// Decode `bytes` and re-encode them in the configured format
    ///
    /// Decode failures are content defects and map to [`FetchError::Decode`].
    pub fn transcode(&self, bytes: &[u8]) -> Result<Vec<u8>, FetchError> {
        let img = image::load_from_memory(bytes).map_err(|e| FetchError::Decode {
            message: e.to_string(),
        })?;

        let normalized = self.normalize(img);
        self.encode(&normalized)
    }

    /// Alpha sources stay RGBA (when the target can carry alpha); everything
    /// else becomes opaque RGB
    fn normalize(&self, img: DynamicImage) -> DynamicImage {
        let keep_alpha = img.color().has_alpha() && self.format.supports_alpha();
        if keep_alpha {
            if matches!(img, DynamicImage::ImageRgba8(_)) {
                img
            } else {
                DynamicImage::ImageRgba8(img.to_rgba8())
            }
        } else if matches!(img, DynamicImage::ImageRgb8(_)) {
            img
        } else {
            DynamicImage::ImageRgb8(img.to_rgb8())
        }
    }

    fn encode(&self, img: &DynamicImage) -> Result<Vec<u8>, FetchError> {
        let mut buffer = Vec::new();

        let result = match self.format {
            LogoAssetFormat::Webp => img.write_with_encoder(WebPEncoder::new_lossless(&mut buffer)),
            LogoAssetFormat::Png => img.write_with_encoder(PngEncoder::new(&mut buffer)),
            LogoAssetFormat::Jpeg => img.write_with_encoder(JpegEncoder::new_with_quality(
                &mut buffer,
                self.quality,
            )),
        };

        result.map_err(|e| FetchError::Encode {
            message: e.to_string(),
        })?;

        Ok(buffer)
    }
}

impl From<&TranscodeConfig> for LogoTranscoder {
    fn from(config: &TranscodeConfig) -> Self {
        Self::new(config.format, config.quality)
    }
}
