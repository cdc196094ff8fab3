//! Share link parsing.
//!
//! Two link styles are recognized:
//!
//! ```text
//! https://play.kkbox.com/album/OspOC7CYqcVQY_uLAV
//! https://www.kkbox.com/tw/tc/song/OspOC7CYqcVQY_uLAV
//! ```

use std::{fmt, str::FromStr, sync::LazyLock};

use regex_lite::Regex;
use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};

/// Kind of media a link points to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Track,
    Album,
    Artist,
    Playlist,
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "track" | "song" => Ok(Self::Track),
            "album" => Ok(Self::Album),
            "artist" => Ok(Self::Artist),
            "playlist" => Ok(Self::Playlist),
            _ => Err(Error::invalid_argument(format!("unknown media kind {s}"))),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Track => write!(f, "track"),
            Self::Album => write!(f, "album"),
            Self::Artist => write!(f, "artist"),
            Self::Playlist => write!(f, "playlist"),
        }
    }
}

/// Media identified by a share link.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct MediaId {
    pub kind: MediaKind,

    /// Public id, 18 characters
    pub id: String,
}

static PLAYER_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(track|album|artist|playlist)/([a-zA-Z0-9_-]{18})")
        .expect("invalid player path pattern")
});

static WEB_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/[a-z]{2}/[a-z]{2}/(song|album|artist|playlist)/([a-zA-Z0-9_-]{18})")
        .expect("invalid web path pattern")
});

/// Parses a share link.
///
/// # Errors
///
/// Returns `InvalidArgument` for malformed URLs, other hosts, and paths
/// that do not name a track, album, artist or playlist.
pub fn parse(link: &str) -> Result<MediaId> {
    let invalid = || Error::invalid_argument(format!("invalid link: {link}"));

    let url = Url::parse(link).map_err(|_| invalid())?;
    let pattern = match url.host_str() {
        Some("play.kkbox.com") => &*PLAYER_PATH,
        Some("www.kkbox.com") => &*WEB_PATH,
        _ => return Err(invalid()),
    };

    let captures = pattern.captures(url.path()).ok_or_else(invalid)?;
    Ok(MediaId {
        kind: captures[1].parse()?,
        id: captures[2].to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_player_links() {
        let media = parse("https://play.kkbox.com/album/OspOC7CYqcVQY_uLAV").unwrap();
        assert_eq!(media.kind, MediaKind::Album);
        assert_eq!(media.id, "OspOC7CYqcVQY_uLAV");
    }

    #[test]
    fn web_song_links_are_tracks() {
        let media = parse("https://www.kkbox.com/tw/tc/song/4mUSt0-oxd1XlUIf-M?x=1").unwrap();
        assert_eq!(media.kind, MediaKind::Track);
        assert_eq!(media.id, "4mUSt0-oxd1XlUIf-M");
    }

    #[test]
    fn rejects_other_links() {
        for link in [
            "https://open.spotify.com/album/OspOC7CYqcVQY_uLAV",
            "https://play.kkbox.com/album/short",
            "https://play.kkbox.com/song/OspOC7CYqcVQY_uLAV",
            "https://www.kkbox.com/album/OspOC7CYqcVQY_uLAV",
            "not a link",
        ] {
            let err = parse(link).unwrap_err();
            assert_eq!(err.kind, crate::error::ErrorKind::InvalidArgument, "{link}");
        }
    }
}
