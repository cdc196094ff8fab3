//! Audio decryption for KKBOX protected downloads.
//!
//! Protected audio files start with a [`HEADER_LEN`] byte header that is not
//! part of the encrypted stream. The rest is RC4-encrypted with the session
//! content key, after discarding the first [`KEYSTREAM_DROP`] keystream
//! bytes.
//!
//! Downloads skip the header with a range request and decrypt each chunk as
//! it arrives, so memory use does not depend on the file size. When a server
//! ignores the range and sends the whole file, the header is dropped from
//! the stream instead.
//!
//! # Example
//!
//! ```rust
//! use std::io::Read;
//! use kkstream::decrypt::Decrypt;
//!
//! let mut decryptor = Decrypt::new(encrypted.as_slice(), session.content_key())?;
//! let mut audio = Vec::new();
//! decryptor.read_to_end(&mut audio)?;
//! ```

use std::{
    io::{self, Read},
    path::Path,
};

use futures_util::StreamExt;
use reqwest::{header::RANGE, StatusCode};
use tokio::{fs::File, io::AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    cipher::Rc4,
    error::{Error, Result},
    http::Client as HttpClient,
};

/// Length of the plain file header skipped by downloads.
pub const HEADER_LEN: u64 = 1024;

/// Keystream bytes discarded before decrypting.
pub const KEYSTREAM_DROP: usize = 512;

/// Buffer size of [`copy`].
pub const CHUNK_LEN: usize = 4096;

/// Returns the cipher for a content key.
///
/// # Errors
///
/// Returns `InvalidArgument` if the key is empty.
pub fn keystream(key: &[u8]) -> Result<Rc4> {
    Rc4::with_drop(key, KEYSTREAM_DROP)
        .ok_or_else(|| Error::invalid_argument("content key is empty"))
}

/// Decrypting reader over an encrypted stream without its header.
///
/// Each byte is decrypted exactly once, in stream order. Decryption is its
/// own inverse: wrapping plaintext yields the ciphertext.
pub struct Decrypt<R> {
    inner: R,
    cipher: Rc4,
}

impl<R: Read> Decrypt<R> {
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the key is empty.
    pub fn new(inner: R, key: &[u8]) -> Result<Self> {
        Ok(Self {
            inner,
            cipher: keystream(key)?,
        })
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Decrypt<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.inner.read(buf)?;
        self.cipher.apply_keystream(&mut buf[..len]);
        Ok(len)
    }
}

/// Decrypts `reader` into `writer` in [`CHUNK_LEN`] byte chunks, returning
/// the number of bytes written.
///
/// # Errors
///
/// Returns an error if the key is empty or on I/O failure.
pub fn copy<R, W>(reader: R, writer: &mut W, key: &[u8]) -> Result<u64>
where
    R: Read,
    W: io::Write,
{
    let mut decryptor = Decrypt::new(reader, key)?;
    let mut buf = [0; CHUNK_LEN];
    let mut written = 0;

    loop {
        let len = match decryptor.read(&mut buf) {
            Ok(0) => break,
            Ok(len) => len,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        writer.write_all(&buf[..len])?;
        written += len as u64;
    }

    writer.flush()?;
    Ok(written)
}

/// Downloads and decrypts a protected file to `path`.
///
/// `progress` is called with the bytes written so far and the expected
/// total, if the server sent one. Returns the number of bytes written.
///
/// The file is only created once the server answered with success, and is
/// removed again when the download fails or is cancelled.
///
/// # Errors
///
/// * `Transport` on network failures and non-success statuses
/// * `Cancelled` when `cancel` fires
/// * `Io` when the file cannot be written
pub async fn download<F>(
    client: &HttpClient,
    url: &Url,
    key: &[u8],
    path: &Path,
    mut progress: F,
    cancel: &CancellationToken,
) -> Result<u64>
where
    F: FnMut(u64, Option<u64>),
{
    let mut cipher = keystream(key)?;
    let request = client
        .unlimited
        .get(url.clone())
        .header(RANGE, format!("bytes={HEADER_LEN}-"))
        .build()?;

    let response = tokio::select! {
        () = cancel.cancelled() => return Err(Error::cancelled("download cancelled")),
        response = client.unlimited.execute(request) => response?,
    };

    let status = response.status();
    if !status.is_success() {
        return Err(Error::transport(format!(
            "{} answered {status}",
            url.host_str().unwrap_or_default()
        )));
    }

    // A server that ignores the range answers 200 with the header included.
    let mut skip = if status == StatusCode::PARTIAL_CONTENT {
        0
    } else {
        debug!("range ignored by {}", url.host_str().unwrap_or_default());
        HEADER_LEN
    };
    let total = response
        .content_length()
        .map(|len| len.saturating_sub(skip));

    let mut file = File::create(path).await?;
    debug!("downloading to {}", path.display());

    let mut stream = response.bytes_stream();
    let mut written = 0;
    progress(written, total);

    let result: Result<u64> = async {
        loop {
            let chunk = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::cancelled("download cancelled")),
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = chunk else {
                break;
            };

            let chunk = chunk.map_err(Error::transport)?;
            let skipped = usize::try_from(skip).map_or(chunk.len(), |skip| skip.min(chunk.len()));
            skip -= skipped as u64;

            let mut chunk = chunk[skipped..].to_vec();
            if chunk.is_empty() {
                continue;
            }
            cipher.apply_keystream(&mut chunk);
            file.write_all(&chunk).await?;

            written += chunk.len() as u64;
            progress(written, total);
        }

        file.flush().await?;
        Ok(written)
    }
    .await;

    if let Err(e) = &result {
        drop(file);
        debug!("removing partial download {}: {e}", path.display());
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("failed to remove {}: {e}", path.display());
        }
    }

    result
}
