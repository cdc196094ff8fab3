//! Metadata and audio provider on top of the [`Gateway`].
//!
//! The provider turns catalogue responses into the records of
//! [`metadata`](crate::metadata), picks ticket formats for quality tiers and
//! hands protected downloads to [`decrypt`](crate::decrypt).
//!
//! # Example
//!
//! ```rust
//! let mut gateway = Gateway::new(&config)?;
//! gateway.login(&secrets.email, &secrets.password).await?;
//!
//! let mut provider = Provider::new(gateway, ProviderOptions::default());
//! let media = kkstream::link::parse("https://play.kkbox.com/album/OspOC7CYqcVQY_uLAV")?;
//! let album = provider.album_info(&media.id, None).await?;
//! ```

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::{
    config::ProviderOptions,
    decrypt,
    error::{Error, Result},
    gateway::Gateway,
    image::{self, ImageFormat},
    link::{self, MediaId, MediaKind},
    lyrics,
    metadata::{
        AlbumInfo, ArtistAlbum, ArtistInfo, CoverInfo, Download, LyricsInfo, PlaylistInfo,
        SearchResult, TrackInfo,
    },
    protocol::{album, artist, search, song::Song, PhotoInfo},
    quality::AudioQuality,
    util,
};

/// Album details shared by the tracks of an album listing.
struct AlbumContext<'a> {
    id: &'a str,
    info: &'a album::Info,
    total_tracks: usize,
    release_year: Option<i32>,
}

pub struct Provider {
    gateway: Gateway,
    options: ProviderOptions,
}

impl Provider {
    /// Wraps a gateway, normally one that is logged in.
    ///
    /// WebP covers are not embeddable, so a WebP cover format falls back to
    /// JPEG.
    #[must_use]
    pub fn new(gateway: Gateway, mut options: ProviderOptions) -> Self {
        if options.cover_format == ImageFormat::Webp {
            options.cover_format = ImageFormat::Jpg;
        }

        if options.check_subscription {
            if let Some(session) = gateway.session() {
                if !session.allows(options.quality) {
                    warn!(
                        "audio quality {} is not available with this subscription",
                        options.quality
                    );
                }
            }
        }

        Self { gateway, options }
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut Gateway {
        &mut self.gateway
    }

    #[must_use]
    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    /// Parses a share link.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for links that are not KKBOX media links.
    pub fn parse_link(link: &str) -> Result<MediaId> {
        link::parse(link)
    }

    fn cover_url(&self, photo: Option<&PhotoInfo>, format: ImageFormat) -> Option<String> {
        photo.map(|photo| image::cover_url(&photo.url_template, self.options.cover_size, format))
    }

    /// Picks the tier to download: the requested one if the track offers it,
    /// otherwise the best one it offers.
    fn effective_quality(song: &Song, requested: AudioQuality) -> AudioQuality {
        if song.audio_quality.is_empty()
            || song
                .audio_quality
                .iter()
                .any(|name| name == requested.as_str())
        {
            return requested;
        }

        song.audio_quality
            .iter()
            .rev()
            .find_map(|name| name.parse().ok())
            .unwrap_or(requested)
    }

    fn track_from_song(
        &self,
        id: &str,
        song: &Song,
        quality: AudioQuality,
        album: Option<&AlbumContext<'_>>,
    ) -> TrackInfo {
        let quality = Self::effective_quality(song, quality);
        let allowed = self
            .gateway
            .session()
            .is_some_and(|session| session.allows(quality));
        let error =
            (!allowed).then(|| format!("quality {quality} is not available with this subscription"));

        let (album_name, album_id, album_artist, artist_id) = match album {
            Some(album) => (
                album.info.album_name.clone(),
                album.id.to_owned(),
                album.info.artist_name.clone(),
                util::last_segment(&album.info.artist_more_url).to_owned(),
            ),
            None => (
                song.album_name.clone(),
                util::last_segment(&song.album_more_url).to_owned(),
                song.artist_name.clone(),
                util::last_segment(&song.artist_more_url).to_owned(),
            ),
        };

        TrackInfo {
            id: id.to_owned(),
            name: song.title().to_owned(),
            album: album_name,
            album_id,
            album_artist,
            artists: song.artist_role.artists(),
            artist_id,
            track_number: song.song_idx,
            total_tracks: album.map(|album| album.total_tracks),
            genres: song.genre_name.iter().cloned().collect(),
            release_date: album
                .map(|album| album.info.album_date.clone())
                .filter(|date| !date.is_empty()),
            release_year: album.and_then(|album| album.release_year),
            explicit: song.song_is_explicit,
            cover_url: self.cover_url(song.album_photo_info.as_ref(), self.options.cover_format),
            quality,
            codec: quality.codec(),
            bitrate: quality.bitrate(),
            bit_depth: quality.bit_depth(),
            sample_rate: quality.sample_rate(),
            has_lyrics: !song.lacks_lyrics(),
            error,
        }
    }

    async fn song(&self, id: &str) -> Result<Song> {
        self.gateway
            .get_songs(&[id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("track {id} not found")))
    }

    /// Gets track metadata for the given quality tier.
    ///
    /// When the subscription does not allow the resulting tier, the record
    /// is still returned, with `error` set.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown tracks.
    pub async fn track_info(&self, id: &str, quality: AudioQuality) -> Result<TrackInfo> {
        let song = self.song(id).await?;
        Ok(self.track_from_song(id, &song, quality, None))
    }

    /// Gets the audio of a track.
    ///
    /// The DRM-free tier is returned as a URL without touching the file
    /// system. Other tiers are downloaded, decrypted into `dir` and returned
    /// as a file path.
    ///
    /// # Errors
    ///
    /// * `NotFound` when the ticket does not offer the tier's format
    /// * errors of [`Gateway::get_ticket`] and [`decrypt::download`]
    pub async fn track_download<F>(
        &mut self,
        id: &str,
        quality: AudioQuality,
        dir: &Path,
        progress: F,
        cancel: &CancellationToken,
    ) -> Result<Download>
    where
        F: FnMut(u64, Option<u64>),
    {
        let format = quality.format_name();
        let uris = self.gateway.get_ticket(id, quality.play_mode()).await?;
        let uri = uris
            .into_iter()
            .find(|uri| uri.name == format)
            .ok_or_else(|| Error::not_found(format!("format {format} not offered for track {id}")))?;

        if quality.is_drm_free() {
            return Ok(Download::Url(uri.url));
        }

        let key = self
            .gateway
            .session()
            .ok_or_else(|| Error::login_failed("not logged in"))?
            .content_key()
            .to_vec();
        let path = dir.join(format!(
            "kkstream-{}.{}",
            uuid::Uuid::new_v4(),
            quality.codec().extension()
        ));

        let len = decrypt::download(
            self.gateway.http_client(),
            &uri.url,
            &key,
            &path,
            progress,
            cancel,
        )
        .await?;
        info!("downloaded track {id} ({len} bytes)");

        Ok(Download::File(path))
    }

    /// Gets album metadata including all tracks.
    ///
    /// Pass `raw_id` when known, for example from search results or artist
    /// info, to skip the id lookup.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown albums and `Decode` for malformed
    /// release dates.
    pub async fn album_info(&self, id: &str, raw_id: Option<&str>) -> Result<AlbumInfo> {
        let raw_id = match raw_id {
            Some(raw_id) => raw_id.to_owned(),
            None => self.gateway.get_album(id).await?.album.album_id,
        };
        let more = self.gateway.get_album_more(&raw_id).await?;
        let info = &more.info;

        let release_year = match info.album_date.as_str() {
            "" => None,
            date => Some(util::year_of(date)?),
        };
        let context = AlbumContext {
            id,
            info,
            total_tracks: more.song_list.song.len(),
            release_year,
        };

        let tracks = more
            .song_list
            .song
            .iter()
            .map(|song| {
                let track_id = util::last_segment(&song.song_more_url);
                self.track_from_song(track_id, song, self.options.quality, Some(&context))
            })
            .collect();

        let photo = info.album_photo_info.as_ref();
        Ok(AlbumInfo {
            id: id.to_owned(),
            raw_id,
            name: info.album_name.clone(),
            artist: info.artist_name.clone(),
            artist_id: util::last_segment(&info.artist_more_url).to_owned(),
            release_date: Some(info.album_date.clone()).filter(|date| !date.is_empty()),
            release_year,
            explicit: info.album_is_explicit,
            description: info.album_descr.clone(),
            cover_url: self.cover_url(photo, self.options.cover_format),
            cover_format: self.options.cover_format,
            jpg_cover_url: self.cover_url(photo, ImageFormat::Jpg),
            tracks,
        })
    }

    /// Gets playlist metadata including all tracks.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown playlists.
    pub async fn playlist_info(&self, id: &str) -> Result<PlaylistInfo> {
        let playlist = self
            .gateway
            .get_playlists(&[id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("playlist {id} not found")))?;

        let release_year = match playlist.created_at.as_str() {
            "" => None,
            date => Some(util::year_of(date)?),
        };
        let tracks = playlist
            .songs
            .iter()
            .map(|song| {
                let track_id = util::last_segment(&song.song_more_url);
                self.track_from_song(track_id, song, self.options.quality, None)
            })
            .collect();

        Ok(PlaylistInfo {
            id: playlist.id,
            name: playlist.title,
            creator: playlist.user.as_ref().map(|user| user.name.clone()),
            creator_id: playlist.user.map(|user| user.id),
            release_year,
            description: playlist.content,
            cover_url: self.cover_url(
                playlist.cover_photo_info.as_ref(),
                self.options.cover_format,
            ),
            cover_format: self.options.cover_format,
            tracks,
        })
    }

    /// Gets an artist and all of their albums.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown artists.
    pub async fn artist_info(&self, id: &str) -> Result<ArtistInfo> {
        let artist = self.gateway.get_artist(id).await?;
        let mut albums = artist.album;

        if albums.len() == artist::FIRST_PAGE_LEN {
            let rest = self
                .gateway
                .get_artist_albums(
                    &artist.profile.artist_id,
                    artist::REMAINDER_LIMIT,
                    artist::FIRST_PAGE_LEN,
                )
                .await?;
            albums.extend(rest);
        }

        Ok(ArtistInfo {
            id: id.to_owned(),
            raw_id: artist.profile.artist_id,
            name: artist.profile.artist_name,
            albums: albums
                .into_iter()
                .map(|album| ArtistAlbum {
                    id: album.encrypted_album_id,
                    raw_id: album.album_id,
                })
                .collect(),
        })
    }

    /// Gets the cover of a track's album.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown tracks and tracks without cover.
    pub async fn track_cover(&self, id: &str, size: u32, format: ImageFormat) -> Result<CoverInfo> {
        let song = self.song(id).await?;
        let template = song
            .album_photo_info
            .ok_or_else(|| Error::not_found(format!("track {id} has no cover")))?
            .url_template;

        Ok(CoverInfo {
            url: image::cover_url(&template, size, format),
            format,
        })
    }

    /// Gets the lyrics of a track.
    ///
    /// Tracks without lyrics yield an empty record rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown tracks.
    pub async fn track_lyrics(&self, id: &str) -> Result<LyricsInfo> {
        let song = self.song(id).await?;
        if song.lacks_lyrics() {
            debug!("track {id} has no lyrics");
            return Ok(LyricsInfo::default());
        }

        let envelope = self.gateway.get_song_lyrics(id).await?;
        let lines = match envelope.into_data("lyrics") {
            Ok(data) => data.lyrics,
            Err(e) => {
                debug!("no lyrics for track {id}: {e}");
                return Ok(LyricsInfo::default());
            }
        };

        let (plain, synced) = lyrics::format(&lines);
        Ok(LyricsInfo {
            plain: Some(plain),
            synced: Some(synced),
        })
    }

    /// Searches the catalogue.
    ///
    /// # Errors
    ///
    /// Returns `Transport` or `Decode` when the request fails.
    pub async fn search(
        &self,
        kind: MediaKind,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let search_kind = match kind {
            MediaKind::Track => search::Kind::Song,
            MediaKind::Album => search::Kind::Album,
            MediaKind::Artist => search::Kind::Artist,
            MediaKind::Playlist => search::Kind::Playlist,
        };
        let response = self.gateway.search(query, search_kind, limit).await?;

        let results = match kind {
            MediaKind::Track => response
                .song_list
                .unwrap_or_default()
                .song
                .into_iter()
                .map(|song| SearchResult {
                    kind,
                    id: util::last_segment(&song.song_more_url).to_owned(),
                    name: song.title().to_owned(),
                    artists: song.artist_role.artists(),
                    explicit: Some(song.song_is_explicit),
                    additional: vec![song.album_name],
                    raw_id: None,
                })
                .collect(),
            MediaKind::Album => response
                .album_list
                .unwrap_or_default()
                .album
                .into_iter()
                .map(|album| SearchResult {
                    kind,
                    id: util::last_segment(&album.album_more_url).to_owned(),
                    name: album.album_name,
                    artists: vec![album.artist_name],
                    explicit: Some(album.album_is_explicit),
                    additional: Vec::new(),
                    raw_id: Some(album.album_id),
                })
                .collect(),
            MediaKind::Artist => response
                .artist_list
                .unwrap_or_default()
                .artist
                .into_iter()
                .map(|artist| SearchResult {
                    kind,
                    id: util::last_segment(&artist.artist_more_url).to_owned(),
                    name: artist.artist_name,
                    artists: Vec::new(),
                    explicit: None,
                    additional: Vec::new(),
                    raw_id: None,
                })
                .collect(),
            MediaKind::Playlist => response
                .playlist_list
                .unwrap_or_default()
                .playlist
                .into_iter()
                .map(|playlist| SearchResult {
                    kind,
                    id: playlist.id,
                    name: playlist.title,
                    artists: playlist.user.map(|user| user.name).into_iter().collect(),
                    explicit: None,
                    additional: playlist.content.into_iter().collect(),
                    raw_id: None,
                })
                .collect(),
        };

        Ok(results)
    }
}
