use super::test_helpers::*;
use super::*;
use crate::types::{BatchSummary, DownloadState, ExistingPolicy, ItemId};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod dispatcher;
