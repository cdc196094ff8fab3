//! Catalogue search via `search_music.php`.
//!
//! Results are keyed by type: a search with `sf=song` answers with
//! `{"song_list": {"song": [...]}}`, and likewise for `album`, `artist`
//! and `playlist`.

use std::fmt;

use serde::Deserialize;
use serde_with::{formats::Flexible, serde_as, BoolFromInt, PickFirst};

use super::{playlist::Playlist, song::Song, string_or_number};

pub const PATH: &str = "search_music.php";

/// Ranking requested from the search endpoint.
pub const RANKING: &str = "sc-A";

/// What to search for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "binary", derive(clap::ValueEnum))]
pub enum Kind {
    #[cfg_attr(feature = "binary", value(name = "track"))]
    Song,
    Album,
    Artist,
    Playlist,
}

impl Kind {
    /// Value of the `sf` query parameter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Song => "song",
            Self::Album => "album",
            Self::Artist => "artist",
            Self::Playlist => "playlist",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Search response; only the list matching the requested kind is present.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Response {
    pub song_list: Option<SongList>,
    pub album_list: Option<AlbumList>,
    pub artist_list: Option<ArtistList>,
    pub playlist_list: Option<PlaylistList>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SongList {
    #[serde(default)]
    pub song: Vec<Song>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AlbumList {
    #[serde(default)]
    pub album: Vec<Album>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ArtistList {
    #[serde(default)]
    pub artist: Vec<Artist>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PlaylistList {
    #[serde(default)]
    pub playlist: Vec<Playlist>,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Album {
    #[serde(deserialize_with = "string_or_number")]
    pub album_id: String,
    pub album_name: String,
    pub album_more_url: String,
    pub artist_name: String,

    #[serde_as(as = "PickFirst<(_, BoolFromInt<Flexible>)>")]
    pub album_is_explicit: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Artist {
    pub artist_name: String,
    pub artist_more_url: String,
}
