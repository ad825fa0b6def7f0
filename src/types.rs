//! Core types for comic-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::Error;

/// Identifier of one item in the source sequence (dense, starting at 1)
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    /// Get the inner value
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Filename prefix (`<id>-`) that keys this item's asset on disk
    pub fn file_prefix(&self) -> String {
        format!("{}-", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ItemId> for u64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = Error;

    /// Parses a positive decimal identifier; zero and non-numeric input are rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(Error::InvalidId(s.to_string())),
            Ok(n) => Ok(Self(n)),
        }
    }
}

/// A resolved item: metadata plus the locator of its image asset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Item {
    /// Item identifier
    pub id: ItemId,
    /// Display title (used for naming only)
    pub title: String,
    /// Fully-qualified asset URI
    pub asset_url: String,
    /// Auxiliary caption text
    pub alt_text: String,
}

/// Per-item download state owned by the state tracker
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    /// Never claimed, or released after a failure
    #[default]
    Unknown,
    /// Claimed by a worker or an interactive request
    InProgress,
    /// Asset is stored on disk
    Done,
}

impl std::fmt::Display for DownloadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DownloadState::Unknown => "unknown",
            DownloadState::InProgress => "in_progress",
            DownloadState::Done => "done",
        };
        f.write_str(s)
    }
}

/// Status view returned to interactive callers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemStatus {
    /// Asset is stored
    pub downloaded: bool,
    /// A claim is currently held
    pub is_downloading: bool,
}

impl From<DownloadState> for ItemStatus {
    fn from(state: DownloadState) -> Self {
        Self {
            downloaded: state == DownloadState::Done,
            is_downloading: state == DownloadState::InProgress,
        }
    }
}

/// Extraction strategy used to turn a fetched page or record into an [`Item`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Machine-readable JSON record (`/<id>/info.0.json`)
    #[default]
    #[serde(alias = "json")]
    Structured,
    /// Element-tree traversal of the rendered page
    #[serde(alias = "html")]
    Markup,
    /// Single regular expression over the rendered page text
    #[serde(alias = "regex")]
    Pattern,
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "json" | "structured" => Ok(Strategy::Structured),
            "html" | "markup" => Ok(Strategy::Markup),
            "regex" | "pattern" => Ok(Strategy::Pattern),
            other => Err(Error::InvalidStrategy(other.to_string())),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Strategy::Structured => "structured",
            Strategy::Markup => "markup",
            Strategy::Pattern => "pattern",
        };
        f.write_str(s)
    }
}

/// What a batch crawl does when it reaches an item that is already stored
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExistingPolicy {
    /// Halt the whole crawl at the first stored item
    #[default]
    StopOnExisting,
    /// Leave stored items alone and keep crawling
    SkipAndContinue,
}

/// Why an item was passed over without being stored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Another worker or request holds the claim
    InProgress,
    /// The asset already exists on disk
    AlreadyStored,
}

/// Events emitted by the downloader
///
/// Subscribe with [`crate::ComicDownloader::subscribe`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// An item was claimed and processing started
    Claimed {
        /// Item ID
        id: ItemId,
    },
    /// An asset was written to storage
    Stored {
        /// Item ID
        id: ItemId,
        /// Final asset path
        #[schema(value_type = String)]
        path: PathBuf,
    },
    /// The item's asset was already present
    AlreadyStored {
        /// Item ID
        id: ItemId,
    },
    /// The item was passed over
    Skipped {
        /// Item ID
        id: ItemId,
        /// Why it was skipped
        reason: SkipReason,
    },
    /// Resolution or storage failed; the claim was released
    Failed {
        /// Item ID
        id: ItemId,
        /// Error message
        error: String,
    },
    /// A batch crawl halted on an already stored item
    BatchStopped {
        /// Item that triggered the stop
        at: ItemId,
    },
    /// A batch crawl finished
    BatchComplete {
        /// Final counters
        summary: BatchSummary,
    },
    /// Downloader is shutting down
    Shutdown,
}

/// Counters reported at the end of a batch crawl
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchSummary {
    /// Assets written during this run
    pub stored: usize,
    /// Items whose asset was already on disk
    pub already_stored: usize,
    /// Items claimed elsewhere at the time
    pub skipped: usize,
    /// Items that failed to resolve or store
    pub failed: usize,
    /// Item that triggered a stop-on-existing halt
    pub stopped_at: Option<ItemId>,
    /// When the run started
    #[schema(value_type = Option<String>)]
    pub started_at: Option<DateTime<Utc>>,
    /// When the run finished
    #[schema(value_type = Option<String>)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchSummary {
    /// Fold another worker's counters into this one
    pub(crate) fn merge(&mut self, other: &BatchSummary) {
        self.stored += other.stored;
        self.already_stored += other.already_stored;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.stopped_at = match (self.stopped_at, other.stopped_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }

    /// Total number of identifiers the workers took off the queue
    pub fn processed(&self) -> usize {
        self.stored + self.already_stored + self.skipped + self.failed
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_parses_positive_integers_only() {
        assert_eq!("42".parse::<ItemId>().unwrap(), ItemId(42));
        assert!(matches!("0".parse::<ItemId>(), Err(Error::InvalidId(_))));
        assert!(matches!("-3".parse::<ItemId>(), Err(Error::InvalidId(_))));
        assert!(matches!("abc".parse::<ItemId>(), Err(Error::InvalidId(_))));
    }

    #[test]
    fn file_prefix_includes_dash() {
        assert_eq!(ItemId(614).file_prefix(), "614-");
    }

    #[test]
    fn strategy_accepts_legacy_names() {
        assert_eq!("json".parse::<Strategy>().unwrap(), Strategy::Structured);
        assert_eq!("".parse::<Strategy>().unwrap(), Strategy::Structured);
        assert_eq!("html".parse::<Strategy>().unwrap(), Strategy::Markup);
        assert_eq!("REGEX".parse::<Strategy>().unwrap(), Strategy::Pattern);
        assert!(matches!(
            "xml".parse::<Strategy>(),
            Err(Error::InvalidStrategy(name)) if name == "xml"
        ));
    }

    #[test]
    fn strategy_deserializes_aliases() {
        let s: Strategy = serde_json::from_str("\"html\"").unwrap();
        assert_eq!(s, Strategy::Markup);
        assert!(serde_json::from_str::<Strategy>("\"xml\"").is_err());
    }

    #[test]
    fn item_status_uses_camel_case() {
        let json = serde_json::to_value(ItemStatus::from(DownloadState::InProgress)).unwrap();
        assert_eq!(json["downloaded"], false);
        assert_eq!(json["isDownloading"], true);
    }

    #[test]
    fn summary_merge_keeps_lowest_stop_point() {
        let mut a = BatchSummary {
            stored: 2,
            stopped_at: Some(ItemId(9)),
            ..Default::default()
        };
        let b = BatchSummary {
            stored: 1,
            failed: 1,
            stopped_at: Some(ItemId(4)),
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.stored, 3);
        assert_eq!(a.failed, 1);
        assert_eq!(a.stopped_at, Some(ItemId(4)));
        assert_eq!(a.processed(), 4);
    }
}
