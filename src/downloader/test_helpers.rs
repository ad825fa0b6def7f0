//! Shared test helpers for creating ComicDownloader instances in tests.

use crate::config::{Config, RetryConfig};
use crate::downloader::ComicDownloader;
use crate::types::ItemId;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing at `base_url` with a fast, non-jittered retry policy
pub(crate) fn test_config(base_url: &str, download_dir: &Path) -> Config {
    let mut config = Config::default();
    config.source.base_url = base_url.to_string();
    config.source.request_timeout = Duration::from_secs(5);
    config.download.download_dir = download_dir.to_path_buf();
    config.download.max_concurrent_downloads = 1;
    config.retry = RetryConfig {
        max_attempts: 1,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_multiplier: 1.0,
        jitter: false,
    };
    config
}

/// Helper to create a test ComicDownloader backed by a temp asset directory.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader(base_url: &str) -> (ComicDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(base_url, &temp_dir.path().join("comics"));
    let downloader = ComicDownloader::new(config).await.unwrap();
    (downloader, temp_dir)
}

/// Structured record body for item `id` whose asset lives on `server`
pub(crate) fn record_json(server: &MockServer, id: u64, title: &str) -> serde_json::Value {
    serde_json::json!({
        "num": id,
        "title": title,
        "safe_title": title,
        "img": format!("{}/comics/{}.png", server.uri(), id),
        "alt": format!("caption {}", id),
    })
}

/// Mount the record and asset for item `id`
pub(crate) async fn mount_item(server: &MockServer, id: u64, title: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/info.0.json", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_json(server, id, title)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/comics/{}.png", id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(asset_bytes(id)))
        .mount(server)
        .await;
}

/// Mount `/info.0.json` announcing `latest` as the newest item
pub(crate) async fn mount_latest(server: &MockServer, latest: u64) {
    Mock::given(method("GET"))
        .and(path("/info.0.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(record_json(server, latest, "Latest")),
        )
        .mount(server)
        .await;
}

/// Start a raw HTTP server whose responses announce `declared` body bytes
/// but deliver only `sent` before the connection drops
///
/// Returns the URL of the asset it serves.
pub(crate) async fn spawn_truncating_server(declared: usize, sent: usize) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\n\r\n",
                declared
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&vec![0x89; sent]).await;
            let _ = socket.flush().await;
            // Dropping the socket cuts the body short
        }
    });
    format!("http://{}/comics/truncated.png", addr)
}

/// Deterministic fake image content for item `id`
pub(crate) fn asset_bytes(id: u64) -> Vec<u8> {
    format!("PNG-{}", id).into_bytes()
}

/// Wait until `id` leaves the in-progress state or the deadline passes
pub(crate) async fn wait_until_settled(downloader: &ComicDownloader, id: ItemId) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while downloader.item_status(id).is_downloading && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
