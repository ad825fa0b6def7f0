//! Batch crawl: a bounded pool of workers draining a shared identifier queue.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::types::{BatchSummary, DownloadState, Event, ExistingPolicy, ItemId, SkipReason};

use super::ComicDownloader;
use super::pipeline::ItemOutcome;

type SharedQueue = Arc<Mutex<VecDeque<ItemId>>>;

impl ComicDownloader {
    /// Crawl every item from 1 up to the newest one
    ///
    /// Discovers the upper bound first; failing to do so is fatal and no worker
    /// starts. Uses the configured worker count and existing-asset policy.
    pub async fn run_batch(&self) -> Result<BatchSummary> {
        let latest = self.resolver.latest().await?;
        self.dispatch(
            (1..=latest.0).map(ItemId),
            self.config.download.max_concurrent_downloads,
            self.config.download.existing_policy,
        )
        .await
    }

    /// Process `ids` with `concurrency` workers
    ///
    /// Each worker repeatedly takes the next identifier, claims it, and runs it
    /// through the pipeline. Per-item failures are counted and logged, never
    /// propagated. With [`ExistingPolicy::StopOnExisting`] the first item found
    /// already stored fires the stop signal: no worker dequeues anything after
    /// that, while items already in flight are allowed to finish.
    ///
    /// Repeated identifiers are queued once, at their first position, so a
    /// duplicate never reads as an existing asset.
    pub async fn dispatch<I>(
        &self,
        ids: I,
        concurrency: usize,
        policy: ExistingPolicy,
    ) -> Result<BatchSummary>
    where
        I: IntoIterator<Item = ItemId>,
    {
        if !self.control.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let mut seen = HashSet::new();
        let queue: VecDeque<ItemId> = ids
            .into_iter()
            .filter(|id| id.0 > 0 && seen.insert(*id))
            .collect();
        let total = queue.len();
        let workers = concurrency.max(1).min(total.max(1));
        let queue: SharedQueue = Arc::new(Mutex::new(queue));
        let stop = self.control.shutdown.child_token();

        tracing::info!(total, workers, ?policy, "Starting batch crawl");

        let mut summary = BatchSummary {
            started_at: Some(chrono::Utc::now()),
            ..Default::default()
        };

        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let downloader = self.clone();
                let queue = Arc::clone(&queue);
                let stop = stop.clone();
                tokio::spawn(async move { downloader.batch_worker(worker, queue, stop, policy).await })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            match result {
                Ok(worker_summary) => summary.merge(&worker_summary),
                Err(e) => tracing::error!(error = %e, "Batch worker panicked"),
            }
        }

        summary.finished_at = Some(chrono::Utc::now());

        tracing::info!(
            stored = summary.stored,
            already_stored = summary.already_stored,
            skipped = summary.skipped,
            failed = summary.failed,
            stopped_at = summary.stopped_at.map(|id| id.0),
            "Batch crawl finished"
        );
        self.emit_event(Event::BatchComplete {
            summary: summary.clone(),
        });

        Ok(summary)
    }

    async fn batch_worker(
        self,
        worker: usize,
        queue: SharedQueue,
        stop: CancellationToken,
        policy: ExistingPolicy,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();

        loop {
            if stop.is_cancelled() {
                tracing::debug!(worker, "Stop signal observed, draining");
                break;
            }

            let next = queue.lock().await.pop_front();
            let Some(id) = next else {
                break;
            };

            match self.state.claim_or_state(id) {
                Ok(()) => {}
                Err(DownloadState::Done) => {
                    summary.already_stored += 1;
                    self.emit_event(Event::Skipped {
                        id,
                        reason: SkipReason::AlreadyStored,
                    });
                    if self.on_existing(id, policy, &stop, &mut summary) {
                        break;
                    }
                    continue;
                }
                Err(_) => {
                    tracing::debug!(worker, item_id = id.0, "Item claimed elsewhere, skipping");
                    summary.skipped += 1;
                    self.emit_event(Event::Skipped {
                        id,
                        reason: SkipReason::InProgress,
                    });
                    continue;
                }
            }

            match self.process_claimed(id).await {
                ItemOutcome::Stored(_) => summary.stored += 1,
                ItemOutcome::AlreadyStored => {
                    summary.already_stored += 1;
                    if self.on_existing(id, policy, &stop, &mut summary) {
                        break;
                    }
                }
                ItemOutcome::Failed(_) => summary.failed += 1,
            }
        }

        summary
    }

    /// Apply the existing-asset policy; returns true when the worker should stop
    fn on_existing(
        &self,
        id: ItemId,
        policy: ExistingPolicy,
        stop: &CancellationToken,
        summary: &mut BatchSummary,
    ) -> bool {
        match policy {
            ExistingPolicy::SkipAndContinue => {
                tracing::info!(item_id = id.0, "Asset already exists, skipping");
                false
            }
            ExistingPolicy::StopOnExisting => {
                if !stop.is_cancelled() {
                    tracing::info!(
                        item_id = id.0,
                        "Asset already exists, stopping crawl (skip-and-continue not set)"
                    );
                    stop.cancel();
                    self.emit_event(Event::BatchStopped { at: id });
                }
                summary.stopped_at = Some(id);
                true
            }
        }
    }
}
