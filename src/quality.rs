//! Audio quality tiers and their wire representations.
//!
//! Each tier maps to:
//! * the name used in a track's `audio_quality` list
//! * the format name to pick out of a ticket response
//! * codec, bitrate, bit depth and sample rate of the resulting file
//!
//! The lowest tier is special: it is requested in cast mode and served as a
//! plain MP3 without DRM.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Ordered audio quality tiers, from lowest to highest fidelity.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "binary", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum AudioQuality {
    /// MP3 at 128 kbps, DRM-free cast format
    #[cfg_attr(feature = "binary", value(name = "128k"))]
    #[serde(rename = "128k")]
    Tier128,
    /// MP3 at 192 kbps
    #[cfg_attr(feature = "binary", value(name = "192k"))]
    #[serde(rename = "192k")]
    Tier192,
    /// AAC at 320 kbps
    #[default]
    #[cfg_attr(feature = "binary", value(name = "320k"))]
    #[serde(rename = "320k")]
    Tier320,
    /// FLAC at 16 bit / 44.1 kHz
    #[cfg_attr(feature = "binary", value(name = "hifi"))]
    HiFi,
    /// FLAC at 24 bit
    #[cfg_attr(feature = "binary", value(name = "hires"))]
    HiRes,
}

/// Audio codec of a downloaded file.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Mp3,
    Aac,
    Flac,
}

impl Codec {
    /// File extension of a decrypted download.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Aac => "m4a",
            Self::Flac => "flac",
        }
    }
}

impl AudioQuality {
    /// Tiers every subscription may stream.
    pub const BASE: [Self; 3] = [Self::Tier128, Self::Tier192, Self::Tier320];

    /// Tiers unlocked by a high quality subscription.
    pub const HIGH: [Self; 2] = [Self::HiFi, Self::HiRes];

    /// Name as used in a track's `audio_quality` list.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tier128 => "128k",
            Self::Tier192 => "192k",
            Self::Tier320 => "320k",
            Self::HiFi => "hifi",
            Self::HiRes => "hires",
        }
    }

    /// Format name to select from a ticket response.
    #[must_use]
    pub fn format_name(self) -> &'static str {
        match self {
            Self::Tier128 => "mp3_128k_chromecast",
            Self::Tier192 => "mp3_192k_kkdrm1",
            Self::Tier320 => "aac_320_download_kkdrm",
            Self::HiFi => "flac_16_download_kkdrm",
            Self::HiRes => "flac_24_download_kkdrm",
        }
    }

    /// Ticket `play_mode` needed to be offered this tier's format.
    #[must_use]
    pub fn play_mode(self) -> Option<&'static str> {
        match self {
            Self::Tier128 => Some("chromecast"),
            _ => None,
        }
    }

    /// Whether the format is served without DRM.
    #[must_use]
    pub fn is_drm_free(self) -> bool {
        self == Self::Tier128
    }

    #[must_use]
    pub fn codec(self) -> Codec {
        match self {
            Self::Tier128 | Self::Tier192 => Codec::Mp3,
            Self::Tier320 => Codec::Aac,
            Self::HiFi | Self::HiRes => Codec::Flac,
        }
    }

    /// Nominal bitrate in kbps, unknown for hi-res.
    #[must_use]
    pub fn bitrate(self) -> Option<u32> {
        match self {
            Self::Tier128 => Some(128),
            Self::Tier192 => Some(192),
            Self::Tier320 => Some(320),
            Self::HiFi => Some(1411),
            Self::HiRes => None,
        }
    }

    #[must_use]
    pub fn bit_depth(self) -> u8 {
        match self {
            Self::HiRes => 24,
            _ => 16,
        }
    }

    /// Sample rate in kHz, unknown for hi-res.
    #[must_use]
    pub fn sample_rate(self) -> Option<f32> {
        match self {
            Self::HiRes => None,
            _ => Some(44.1),
        }
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AudioQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "128k" => Ok(Self::Tier128),
            "192k" => Ok(Self::Tier192),
            "320k" => Ok(Self::Tier320),
            "hifi" => Ok(Self::HiFi),
            "hires" => Ok(Self::HiRes),
            other => Err(Error::invalid_argument(format!(
                "unknown audio quality: {other}"
            ))),
        }
    }
}
