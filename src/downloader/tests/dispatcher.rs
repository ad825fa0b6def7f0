use super::*;

fn stored_files(downloader: &ComicDownloader) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(downloader.store().dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_dispatch_stores_every_item() {
    let server = MockServer::start().await;
    for id in 1..=6 {
        mount_item(&server, id, &format!("Item {}", id)).await;
    }
    let (downloader, _temp_dir) = create_test_downloader(&server.uri()).await;

    let summary = downloader
        .dispatch((1..=6).map(ItemId), 3, ExistingPolicy::StopOnExisting)
        .await
        .unwrap();

    assert_eq!(summary.stored, 6);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.stopped_at, None);
    assert_eq!(stored_files(&downloader).len(), 6);
    assert_eq!(downloader.state().done_count(), 6);
}

#[tokio::test]
async fn test_stop_on_existing_halts_before_later_items() {
    let server = MockServer::start().await;
    mount_item(&server, 1, "One").await;
    mount_item(&server, 2, "Two").await;
    Mock::given(method("GET"))
        .and(path("/3/info.0.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_json(&server, 3, "Three")))
        .expect(0)
        .mount(&server)
        .await;
    let (downloader, _temp_dir) = create_test_downloader(&server.uri()).await;

    // Appears after startup, so item 2 is discovered by the pipeline
    std::fs::write(downloader.store().dir().join("2-Two.png"), b"old").unwrap();

    let summary = downloader
        .dispatch((1..=3).map(ItemId), 1, ExistingPolicy::StopOnExisting)
        .await
        .unwrap();

    assert_eq!(summary.stored, 1);
    assert_eq!(summary.already_stored, 1);
    assert_eq!(summary.stopped_at, Some(ItemId(2)));
    assert_eq!(
        downloader.item_status(ItemId(3)),
        DownloadState::Unknown.into()
    );
    assert_eq!(stored_files(&downloader), vec!["1-One.png", "2-Two.png"]);
}

#[tokio::test]
async fn test_stop_on_existing_uses_rebuilt_state() {
    let server = MockServer::start().await;
    mount_item(&server, 1, "One").await;
    let temp_dir = tempfile::tempdir().unwrap();
    let dir = temp_dir.path().join("comics");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("2-Two.png"), b"old").unwrap();

    let downloader = ComicDownloader::new(test_config(&server.uri(), &dir))
        .await
        .unwrap();

    let summary = downloader
        .dispatch((1..=3).map(ItemId), 1, ExistingPolicy::StopOnExisting)
        .await
        .unwrap();

    assert_eq!(summary.stored, 1);
    assert_eq!(summary.already_stored, 1);
    assert_eq!(summary.stopped_at, Some(ItemId(2)));
}

#[tokio::test]
async fn test_skip_and_continue_processes_remaining_items() {
    let server = MockServer::start().await;
    for id in 1..=4 {
        mount_item(&server, id, &format!("Item {}", id)).await;
    }
    let (downloader, _temp_dir) = create_test_downloader(&server.uri()).await;
    std::fs::write(downloader.store().dir().join("2-Item_2.png"), b"old").unwrap();

    let summary = downloader
        .dispatch((1..=4).map(ItemId), 2, ExistingPolicy::SkipAndContinue)
        .await
        .unwrap();

    assert_eq!(summary.stored, 3);
    assert_eq!(summary.already_stored, 1);
    assert_eq!(summary.stopped_at, None);
    assert_eq!(stored_files(&downloader).len(), 4);
}

#[tokio::test]
async fn test_missing_item_is_logged_and_crawl_continues() {
    let server = MockServer::start().await;
    mount_item(&server, 1, "One").await;
    Mock::given(method("GET"))
        .and(path("/2/info.0.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_item(&server, 3, "Three").await;
    let (downloader, _temp_dir) = create_test_downloader(&server.uri()).await;

    let summary = downloader
        .dispatch((1..=3).map(ItemId), 1, ExistingPolicy::StopOnExisting)
        .await
        .unwrap();

    assert_eq!(summary.stored, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(stored_files(&downloader), vec!["1-One.png", "3-Three.png"]);
}

#[tokio::test]
async fn test_in_progress_items_are_skipped() {
    let server = MockServer::start().await;
    mount_item(&server, 1, "One").await;
    Mock::given(method("GET"))
        .and(path("/2/info.0.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_json(&server, 2, "Two")))
        .expect(0)
        .mount(&server)
        .await;
    let (downloader, _temp_dir) = create_test_downloader(&server.uri()).await;

    // Held by someone else for the whole batch
    assert!(downloader.state().try_claim(ItemId(2)));

    let summary = downloader
        .dispatch((1..=2).map(ItemId), 1, ExistingPolicy::StopOnExisting)
        .await
        .unwrap();

    assert_eq!(summary.stored, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(
        downloader.state().snapshot(ItemId(2)),
        DownloadState::InProgress
    );
}

#[tokio::test]
async fn test_run_batch_crawls_up_to_latest() {
    let server = MockServer::start().await;
    mount_latest(&server, 3).await;
    for id in 1..=3 {
        mount_item(&server, id, &format!("Item {}", id)).await;
    }
    let (downloader, _temp_dir) = create_test_downloader(&server.uri()).await;
    let mut events = downloader.subscribe();

    let summary = downloader.run_batch().await.unwrap();
    assert_eq!(summary.stored, 3);
    assert!(summary.started_at.is_some());
    assert!(summary.finished_at >= summary.started_at);

    let complete = loop {
        match events.recv().await.unwrap() {
            Event::BatchComplete { summary } => break summary,
            _ => continue,
        }
    };
    assert_eq!(complete.stored, 3);
}

#[tokio::test]
async fn test_run_batch_fails_when_latest_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/info.0.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_json(&server, 1, "One")))
        .expect(0)
        .mount(&server)
        .await;
    let (downloader, _temp_dir) = create_test_downloader(&server.uri()).await;

    assert!(downloader.run_batch().await.is_err());
}

#[tokio::test]
async fn test_dispatch_with_zero_concurrency_still_runs() {
    let server = MockServer::start().await;
    mount_item(&server, 1, "One").await;
    let (downloader, _temp_dir) = create_test_downloader(&server.uri()).await;

    let summary: BatchSummary = downloader
        .dispatch([ItemId(1)], 0, ExistingPolicy::StopOnExisting)
        .await
        .unwrap();
    assert_eq!(summary.stored, 1);
}

#[tokio::test]
async fn test_duplicate_ids_do_not_trigger_stop() {
    let server = MockServer::start().await;
    mount_item(&server, 1, "One").await;
    mount_item(&server, 2, "Two").await;
    let (downloader, _temp_dir) = create_test_downloader(&server.uri()).await;

    let summary = downloader
        .dispatch(
            [1, 1, 2, 1].into_iter().map(ItemId),
            2,
            ExistingPolicy::StopOnExisting,
        )
        .await
        .unwrap();

    assert_eq!(summary.stored, 2);
    assert_eq!(summary.already_stored, 0);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.stopped_at, None);
    assert_eq!(stored_files(&downloader), vec!["1-One.png", "2-Two.png"]);
}
