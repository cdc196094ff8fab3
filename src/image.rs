//! Cover art URLs.
//!
//! The API hands out URL templates with `{width}`, `{height}` and
//! `{format}` placeholders, for example:
//!
//! ```text
//! https://i.kfs.io/album/global/123,0v1/fit/{width}x{height}.{format}
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Cover image file type.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binary", derive(clap::ValueEnum))]
pub enum ImageFormat {
    #[default]
    Jpg,
    Png,
    Webp,
}

impl ImageFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            _ => Err(Error::invalid_argument(format!("unknown image format {s}"))),
        }
    }
}

/// Largest edge length that can be requested by size. Larger sizes get the
/// original upload.
pub const MAX_SCALED_SIZE: u32 = 2048;

/// Fills in a cover URL template.
///
/// Placeholders are replaced literally; no other part of the template is
/// interpreted.
#[must_use]
pub fn cover_url(template: &str, size: u32, format: ImageFormat) -> String {
    let url = if size > MAX_SCALED_SIZE {
        template
            .replace("fit/{width}x{height}", "original")
            .replace("cropresize/{width}x{height}", "original")
    } else {
        let size = size.to_string();
        template
            .replace("{width}", &size)
            .replace("{height}", &size)
    };

    url.replace("{format}", format.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "https://i.kfs.io/album/global/1,0v1/fit/{width}x{height}.{format}";

    #[test]
    fn substitutes_size_and_format() {
        assert_eq!(
            cover_url(TEMPLATE, 1400, ImageFormat::Png),
            "https://i.kfs.io/album/global/1,0v1/fit/1400x1400.png"
        );
    }

    #[test]
    fn large_sizes_request_original() {
        assert_eq!(
            cover_url(TEMPLATE, 3000, ImageFormat::Jpg),
            "https://i.kfs.io/album/global/1,0v1/original.jpg"
        );
        assert_eq!(
            cover_url("https://x/cropresize/{width}x{height}.{format}", 2049, ImageFormat::Jpg),
            "https://x/original.jpg"
        );
    }

    #[test]
    fn boundary_size_is_scaled() {
        assert!(cover_url(TEMPLATE, MAX_SCALED_SIZE, ImageFormat::Jpg).contains("2048x2048"));
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("JPEG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpg);
        assert!("gif".parse::<ImageFormat>().is_err());
    }
}
