//! Song metadata as returned by `v2/song`, album and playlist listings, and
//! search.
//!
//! Fields differ slightly between endpoints: `v2/song` names the title
//! `song_name` while some listings only carry `text`, and artist roles come
//! either flattened or wrapped in `*_list` objects.

use serde::Deserialize;
use serde_with::{formats::Flexible, serde_as, BoolFromInt, DisplayFromStr, PickFirst};

use super::PhotoInfo;

/// Path of the song lookup endpoint.
pub const PATH: &str = "v2/song";

/// Extra fields requested from `v2/song`.
pub const FIELDS: &str = "artist_role,song_idx,album_photo_info,song_is_explicit,song_more_url,album_more_url,artist_more_url,genre_name,is_lyrics,audio_quality";

/// Payload of `v2/song`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Songs {
    pub songs: Vec<Song>,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Song {
    pub song_name: Option<String>,
    pub text: Option<String>,

    pub artist_name: String,
    pub album_name: String,

    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub song_idx: Option<u32>,

    pub genre_name: Option<String>,
    pub artist_role: ArtistRole,

    /// Available quality names, ascending
    pub audio_quality: Vec<String>,

    pub song_more_url: String,
    pub album_more_url: String,
    pub artist_more_url: String,

    pub album_photo_info: Option<PhotoInfo>,

    #[serde_as(as = "PickFirst<(_, BoolFromInt<Flexible>)>")]
    pub song_is_explicit: bool,

    #[serde_as(as = "Option<PickFirst<(_, BoolFromInt<Flexible>)>>")]
    pub is_lyrics: Option<bool>,
    pub song_lyrics_valid: Option<i64>,
}

impl Song {
    /// Title, whichever field the endpoint used.
    #[must_use]
    pub fn title(&self) -> &str {
        self.song_name
            .as_deref()
            .or(self.text.as_deref())
            .unwrap_or_default()
    }

    /// Whether the song is known to have no lyrics.
    #[must_use]
    pub fn lacks_lyrics(&self) -> bool {
        self.is_lyrics == Some(false) || self.song_lyrics_valid == Some(0)
    }
}

/// Credited artists of a song.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArtistRole {
    pub mainartists: Vec<String>,
    pub featuredartists: Vec<String>,
    pub mainartist_list: Option<MainArtistList>,
    pub featuredartist_list: Option<FeaturedArtistList>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MainArtistList {
    #[serde(default)]
    pub mainartist: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct FeaturedArtistList {
    #[serde(default)]
    pub featuredartist: Vec<String>,
}

impl ArtistRole {
    /// Main artists followed by featured artists.
    ///
    /// The wrapped `*_list` form takes precedence over the flat form.
    #[must_use]
    pub fn artists(&self) -> Vec<String> {
        let main = self
            .mainartist_list
            .as_ref()
            .map_or(&self.mainartists, |list| &list.mainartist);
        let featured = self
            .featuredartist_list
            .as_ref()
            .map_or(&self.featuredartists, |list| &list.featuredartist);

        main.iter().chain(featured).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_artist_roles() {
        let song: Song = serde_json::from_str(
            r#"{
                "text": "Title",
                "artist_name": "Main",
                "album_name": "Album",
                "song_idx": "3",
                "song_is_explicit": 0,
                "artist_role": {
                    "mainartist_list": {"mainartist": ["Main"]},
                    "featuredartist_list": {"featuredartist": ["Guest"]}
                },
                "audio_quality": ["128k", "320k"]
            }"#,
        )
        .unwrap();

        assert_eq!(song.title(), "Title");
        assert_eq!(song.song_idx, Some(3));
        assert!(!song.song_is_explicit);
        assert_eq!(song.artist_role.artists(), ["Main", "Guest"]);
    }

    #[test]
    fn parses_flat_artist_roles() {
        let song: Song = serde_json::from_str(
            r#"{
                "song_name": "Title",
                "song_idx": 7,
                "song_is_explicit": true,
                "artist_role": {"mainartists": ["A", "B"]}
            }"#,
        )
        .unwrap();

        assert_eq!(song.song_idx, Some(7));
        assert!(song.song_is_explicit);
        assert_eq!(song.artist_role.artists(), ["A", "B"]);
    }

    #[test]
    fn detects_missing_lyrics() {
        let song = Song {
            song_lyrics_valid: Some(0),
            ..Song::default()
        };
        assert!(song.lacks_lyrics());
        assert!(!Song::default().lacks_lyrics());

        let song: Song = serde_json::from_str(r#"{"song_name":"x","is_lyrics":0}"#).unwrap();
        assert!(song.lacks_lyrics());
        let song: Song = serde_json::from_str(r#"{"song_name":"x","is_lyrics":1}"#).unwrap();
        assert!(!song.lacks_lyrics());
        let song: Song = serde_json::from_str(r#"{"song_name":"x","is_lyrics":false}"#).unwrap();
        assert!(song.lacks_lyrics());
    }
}
