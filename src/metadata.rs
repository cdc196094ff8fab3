//! Metadata records returned by the [`Provider`](crate::provider::Provider).
//!
//! All records serialize to JSON for the command line interface.

use std::path::PathBuf;

use serde::Serialize;
use url::Url;

use crate::{
    image::ImageFormat,
    link::MediaKind,
    quality::{AudioQuality, Codec},
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackInfo {
    /// Public id
    pub id: String,
    pub name: String,

    pub album: String,
    pub album_id: String,
    pub album_artist: String,

    /// Main artists followed by featured artists
    pub artists: Vec<String>,
    pub artist_id: String,

    pub track_number: Option<u32>,
    pub total_tracks: Option<usize>,
    pub genres: Vec<String>,
    pub release_date: Option<String>,
    pub release_year: Option<i32>,
    pub explicit: bool,
    pub cover_url: Option<String>,

    /// Tier that will be downloaded, after falling back to the best tier
    /// the track offers
    pub quality: AudioQuality,
    pub codec: Codec,
    pub bitrate: Option<u32>,
    pub bit_depth: u8,
    pub sample_rate: Option<f32>,

    pub has_lyrics: bool,

    /// Reason the track cannot be downloaded as described
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlbumInfo {
    pub id: String,
    pub raw_id: String,
    pub name: String,
    pub artist: String,
    pub artist_id: String,
    pub release_date: Option<String>,
    pub release_year: Option<i32>,
    pub explicit: bool,
    pub description: Option<String>,

    pub cover_url: Option<String>,
    pub cover_format: ImageFormat,

    /// Cover in JPEG regardless of the configured format, for embedding
    pub jpg_cover_url: Option<String>,

    pub tracks: Vec<TrackInfo>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaylistInfo {
    pub id: String,
    pub name: String,
    pub creator: Option<String>,
    pub creator_id: Option<String>,
    pub release_year: Option<i32>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub cover_format: ImageFormat,
    pub tracks: Vec<TrackInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArtistInfo {
    pub id: String,
    pub raw_id: String,
    pub name: String,
    pub albums: Vec<ArtistAlbum>,
}

/// Album of an artist, with both ids so that no extra lookup is needed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArtistAlbum {
    pub id: String,
    pub raw_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CoverInfo {
    pub url: String,
    pub format: ImageFormat,
}

/// Lyrics of a track; both fields are `None` when there are none.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LyricsInfo {
    pub plain: Option<String>,
    pub synced: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResult {
    pub kind: MediaKind,
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub explicit: Option<bool>,

    /// Secondary information, like the album of a track
    pub additional: Vec<String>,

    /// Raw album id, saves a lookup in [`album_info`]
    ///
    /// [`album_info`]: crate::provider::Provider::album_info
    pub raw_id: Option<String>,
}

/// Where to get the audio of a track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Download {
    /// DRM-free file to fetch as is
    Url(Url),

    /// Decrypted file on local storage
    File(PathBuf),
}
