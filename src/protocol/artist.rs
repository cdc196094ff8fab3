//! Artist lookups.
//!
//! `v3/artist/{id}` returns the profile and the first page of albums. When
//! that page is full, the remainder is listed by
//! `v2/artist/{raw id}/album?limit=..&offset=..`.

use serde::Deserialize;

use super::string_or_number;

/// Number of albums included in the artist lookup.
pub const FIRST_PAGE_LEN: usize = 10;

/// Limit large enough to list the remaining albums in one request.
pub const REMAINDER_LIMIT: u32 = 8_008_135;

#[must_use]
pub fn path(id: &str) -> String {
    format!("v3/artist/{id}")
}

#[must_use]
pub fn albums_path(raw_id: &str) -> String {
    format!("v2/artist/{raw_id}/album")
}

/// Payload of `v3/artist/{id}`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Artist {
    pub profile: Profile,

    #[serde(default)]
    pub album: Vec<Album>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Profile {
    #[serde(deserialize_with = "string_or_number")]
    pub artist_id: String,
    pub artist_name: String,
}

/// Payload of `v2/artist/{raw id}/album`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Albums {
    #[serde(default)]
    pub album: Vec<Album>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Album {
    /// Public id, as used in share links
    pub encrypted_album_id: String,

    /// Raw id, as used by `album_more.php`
    #[serde(deserialize_with = "string_or_number")]
    pub album_id: String,
}
