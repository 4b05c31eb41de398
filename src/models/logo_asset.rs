use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encoding used for cached logo assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogoAssetFormat {
    /// Lossless WebP; alpha preserved
    #[default]
    #[serde(rename = "webp")]
    Webp,
    /// PNG; alpha preserved
    #[serde(rename = "png")]
    Png,
    /// JPEG at the configured quality; alpha is flattened
    #[serde(rename = "jpeg")]
    Jpeg,
}

impl LogoAssetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            LogoAssetFormat::Webp => "webp",
            LogoAssetFormat::Png => "png",
            LogoAssetFormat::Jpeg => "jpg",
        }
    }

    pub fn supports_alpha(&self) -> bool {
        !matches!(self, LogoAssetFormat::Jpeg)
    }
}

impl fmt::Display for LogoAssetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogoAssetFormat::Webp => "webp",
            LogoAssetFormat::Png => "png",
            LogoAssetFormat::Jpeg => "jpeg",
        };
        f.write_str(name)
    }
}

impl FromStr for LogoAssetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webp" => Ok(LogoAssetFormat::Webp),
            "png" => Ok(LogoAssetFormat::Png),
            "jpeg" | "jpg" => Ok(LogoAssetFormat::Jpeg),
            other => Err(format!("unsupported logo format '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("WebP".parse::<LogoAssetFormat>().unwrap(), LogoAssetFormat::Webp);
        assert_eq!("jpg".parse::<LogoAssetFormat>().unwrap(), LogoAssetFormat::Jpeg);
        assert!("bmp".parse::<LogoAssetFormat>().is_err());
    }

    #[test]
    fn test_extensions() {
        assert_eq!(LogoAssetFormat::default().extension(), "webp");
        assert_eq!(LogoAssetFormat::Jpeg.extension(), "jpg");
        assert!(!LogoAssetFormat::Jpeg.supports_alpha());
    }
}
