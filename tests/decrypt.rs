mod common;

use std::{path::PathBuf, time::Duration};

use axum::http::{header, StatusCode};
use tokio_util::sync::CancellationToken;

use kkstream::{
    config::ProviderOptions,
    decrypt,
    error::ErrorKind,
    http::Client,
    metadata::Download,
    provider::Provider,
    quality::AudioQuality,
};

use common::{plaintext, Fixture, CONTENT_KEY};

fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!("kkstream-test-{}", uuid::Uuid::new_v4()))
}

async fn download(fixture: &Fixture, path: &PathBuf) -> kkstream::error::Result<u64> {
    let client = Client::new(&fixture.config()).unwrap();
    decrypt::download(
        &client,
        &fixture.audio_url(),
        CONTENT_KEY.as_bytes(),
        path,
        |_, _| {},
        &CancellationToken::new(),
    )
    .await
}

#[tokio::test]
async fn download_skips_header_and_decrypts() {
    let fixture = Fixture::start().await;

    for len in [0, 1, 4095, 4096, 4097, 1_000_000] {
        let data = plaintext(len);
        fixture.set_audio(&data);
        let path = temp_path();

        let written = download(&fixture, &path).await.unwrap();
        assert_eq!(written, len as u64);
        assert_eq!(std::fs::read(&path).unwrap(), data, "length {len}");
        std::fs::remove_file(&path).unwrap();
    }

    for request in fixture.requests_to("/audio/track.m4a") {
        assert_eq!(request.headers[header::RANGE], "bytes=1024-");
    }
}

#[tokio::test]
async fn download_is_deterministic() {
    let fixture = Fixture::start().await;
    fixture.set_audio(&plaintext(50_000));

    let (first, second) = (temp_path(), temp_path());
    download(&fixture, &first).await.unwrap();
    download(&fixture, &second).await.unwrap();

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
    std::fs::remove_file(&first).unwrap();
    std::fs::remove_file(&second).unwrap();
}

#[tokio::test]
async fn download_reports_progress() {
    let fixture = Fixture::start().await;
    fixture.set_audio(&plaintext(100_000));
    let client = Client::new(&fixture.config()).unwrap();
    let path = temp_path();

    let mut calls = Vec::new();
    decrypt::download(
        &client,
        &fixture.audio_url(),
        CONTENT_KEY.as_bytes(),
        &path,
        |written, total| calls.push((written, total)),
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(calls.first(), Some(&(0, Some(100_000))));
    assert_eq!(calls.last(), Some(&(100_000, Some(100_000))));
    assert!(calls.windows(2).all(|pair| pair[0].0 <= pair[1].0));
}

#[tokio::test]
async fn error_status_creates_no_file() {
    let fixture = Fixture::start().await;
    *fixture.audio_status.lock().unwrap() = StatusCode::FORBIDDEN;
    let path = temp_path();

    let err = download(&fixture, &path).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Transport);
    assert!(!path.exists());
}

#[tokio::test]
async fn cancelled_download_leaves_no_file() {
    let fixture = Fixture::start().await;
    fixture.set_audio(&plaintext(10_000));
    let client = Client::new(&fixture.config()).unwrap();
    let path = temp_path();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = decrypt::download(
        &client,
        &fixture.audio_url(),
        CONTENT_KEY.as_bytes(),
        &path,
        |_, _| {},
        &cancel,
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Cancelled);
    assert!(!path.exists());
}

#[tokio::test]
async fn ignored_range_still_skips_header() {
    let fixture = Fixture::start().await;
    let data = plaintext(5000);
    fixture.set_audio(&data);
    *fixture.audio_status.lock().unwrap() = StatusCode::OK;
    let client = Client::new(&fixture.config()).unwrap();
    let path = temp_path();

    let mut totals = Vec::new();
    let written = decrypt::download(
        &client,
        &fixture.audio_url(),
        CONTENT_KEY.as_bytes(),
        &path,
        |_, total| totals.push(total),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(written, 5000);
    assert_eq!(std::fs::read(&path).unwrap(), data);
    assert!(totals.iter().all(|total| *total == Some(5000)));
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn cancelling_midway_removes_partial_file() {
    let fixture = Fixture::start().await;
    fixture.set_audio(&plaintext(200_000));
    let client = Client::new(&fixture.config()).unwrap();
    let path = temp_path();

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let err = decrypt::download(
        &client,
        &fixture.audio_url(),
        CONTENT_KEY.as_bytes(),
        &path,
        |written, _| {
            if written > 0 {
                assert!(path.exists());
                token.cancel();
            }
        },
        &cancel,
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Cancelled);
    assert!(!path.exists());
}

#[tokio::test]
async fn broken_stream_removes_partial_file() {
    let fixture = Fixture::start().await;
    fixture.set_audio(&plaintext(100_000));
    fixture
        .audio_fails_midway
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let path = temp_path();

    let err = download(&fixture, &path).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Transport);
    assert!(!path.exists());
}

#[tokio::test]
async fn downloads_bypass_rate_limit() {
    let fixture = Fixture::start().await;
    fixture.set_audio(&plaintext(16));
    let client = Client::new(&fixture.config()).unwrap();
    let path = temp_path();

    // Twice the API burst; throttled, the tail would take five more seconds.
    let downloads = async {
        for _ in 0..100 {
            decrypt::download(
                &client,
                &fixture.audio_url(),
                CONTENT_KEY.as_bytes(),
                &path,
                |_, _| {},
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        }
    };
    tokio::time::timeout(Duration::from_secs(3), downloads)
        .await
        .expect("downloads were throttled");
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn cast_format_is_returned_as_url() {
    let fixture = Fixture::start().await;
    let gateway = fixture.session().await;
    let mut provider = Provider::new(gateway, ProviderOptions::default());

    let dir = temp_path();
    let download = provider
        .track_download(
            "track-id",
            AudioQuality::Tier128,
            &dir,
            |_, _| {},
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(download, Download::Url(fixture.cast_url()));
    assert!(!dir.exists());
    assert!(fixture.requests_to("/audio/cast.mp3").is_empty());

    let ticket = &fixture.requests_to("/ticket/v1/ticket")[0];
    assert_eq!(ticket.json()["play_mode"], "chromecast");
}

#[tokio::test]
async fn protected_format_is_decrypted_to_file() {
    let fixture = Fixture::start().await;
    let data = plaintext(20_000);
    fixture.set_audio(&data);
    let gateway = fixture.session().await;
    let mut provider = Provider::new(gateway, ProviderOptions::default());

    let dir = std::env::temp_dir();
    let download = provider
        .track_download(
            "track-id",
            AudioQuality::Tier320,
            &dir,
            |_, _| {},
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let Download::File(path) = download else {
        panic!("expected a decrypted file");
    };
    assert_eq!(path.extension().unwrap(), "m4a");
    assert_eq!(std::fs::read(&path).unwrap(), data);
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn missing_format_is_not_found() {
    let fixture = Fixture::start().await;
    let gateway = fixture.session().await;
    let mut provider = Provider::new(gateway, ProviderOptions::default());

    let err = provider
        .track_download(
            "track-id",
            AudioQuality::HiFi,
            &std::env::temp_dir(),
            |_, _| {},
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
