//! Playlist lookups via `v1/playlists?playlist_ids=..`.

use serde::Deserialize;

use super::{song::Song, string_or_number, PhotoInfo};

pub const PATH: &str = "v1/playlists";

/// Payload of `v1/playlists`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Playlists {
    pub playlists: Vec<Playlist>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Playlist {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    pub content: Option<String>,
    pub created_at: String,
    pub user: Option<User>,
    pub cover_photo_info: Option<PhotoInfo>,
    pub songs: Vec<Song>,
}

/// Creator of a playlist.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}
