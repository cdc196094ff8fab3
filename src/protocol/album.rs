//! Album lookups.
//!
//! Public album ids (as seen in share links) first have to be resolved into
//! raw ids via `v1/album/{id}`. The track listing then comes from
//! `album_more.php?album={raw id}`, which has no status envelope:
//!
//! ```json
//! {
//!     "info": { "album_name": "...", "album_date": "2020-01-31", ... },
//!     "song_list": { "song": [ ... ] }
//! }
//! ```

use serde::Deserialize;
use serde_with::{formats::Flexible, serde_as, BoolFromInt, PickFirst};

use super::{song::Song, string_or_number, PhotoInfo};

/// Path of the track listing endpoint.
pub const MORE_PATH: &str = "album_more.php";

/// Path of the album lookup endpoint.
#[must_use]
pub fn path(id: &str) -> String {
    format!("v1/album/{id}")
}

/// Payload of `v1/album/{id}`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Lookup {
    pub album: RawAlbum,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawAlbum {
    #[serde(deserialize_with = "string_or_number")]
    pub album_id: String,
}

/// Response of `album_more.php`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct More {
    pub info: Info,
    pub song_list: SongList,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Info {
    pub album_name: String,
    pub artist_name: String,
    pub album_date: String,

    #[serde_as(as = "PickFirst<(_, BoolFromInt<Flexible>)>")]
    pub album_is_explicit: bool,

    pub album_more_url: String,
    pub artist_more_url: String,
    pub album_photo_info: Option<PhotoInfo>,
    pub album_descr: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SongList {
    #[serde(default)]
    pub song: Vec<Song>,
}
