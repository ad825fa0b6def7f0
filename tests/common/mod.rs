//! Shared helpers for integration tests

#![allow(dead_code)]

use comic_dl::{ComicDownloader, Config, ItemId, RetryConfig};
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Comic page markup in the shape the source renders it
pub fn page_html(id: u64, title: &str, alt: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><title>xkcd: {title}</title></head>
<body>
<div id="ctitle">{title}</div>
<div id="comic">
<img src="//imgs.example.invalid/comics/{id}.png" title="{alt}" alt="{title}" />
</div>
</body></html>"#
    )
}

/// Config pointing at `server` with fast retries
pub fn config_for(server: &MockServer, dir: &Path) -> Config {
    let mut config = Config::default();
    config.source.base_url = server.uri();
    config.download.download_dir = dir.to_path_buf();
    config.download.max_concurrent_downloads = 2;
    config.retry = RetryConfig {
        max_attempts: 1,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_multiplier: 1.0,
        jitter: false,
    };
    config
}

/// Mount a full source with items `1..=latest`, each resolvable by every strategy
pub async fn mount_source(server: &MockServer, latest: u64) {
    for id in 1..=latest {
        let title = format!("Comic {id}");
        let record = serde_json::json!({
            "num": id,
            "title": title,
            "img": format!("{}/comics/{}.png", server.uri(), id),
            "alt": format!("alt {id}"),
        });
        Mock::given(method("GET"))
            .and(path(format!("/{id}/info.0.json")))
            .respond_with(ResponseTemplate::new(200).set_body_json(record.clone()))
            .mount(server)
            .await;
        if id == latest {
            Mock::given(method("GET"))
                .and(path("/info.0.json"))
                .respond_with(ResponseTemplate::new(200).set_body_json(record))
                .mount(server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path(format!("/comics/{id}.png")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(format!("img-{id}")))
            .mount(server)
            .await;
    }
}

/// Poll until `id` is stored or five seconds pass
pub async fn wait_for_stored(downloader: &ComicDownloader, id: ItemId) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if downloader.item_status(id).downloaded {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
