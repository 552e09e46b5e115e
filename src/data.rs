use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::Value;

/// One sale order exactly as the API returned it.
pub type Listing = Value;

/// Decoded body of a single `orders/asks/v5` response.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrdersPage {
    #[serde(default)]
    pub orders: Option<Vec<Listing>>,
    #[serde(default)]
    pub continuation: Option<String>,
}

impl OrdersPage {
    /// The cursor for the next page, if the server says there is one.
    pub fn next_continuation(&self) -> Option<&str> {
        self.continuation.as_deref().filter(|token| !token.is_empty())
    }
}

/// All listings captured by one run.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub captured_at: DateTime<Local>,
    pub contract: String,
    pub listings: Vec<Listing>,
}

/// Where a snapshot ended up on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedSnapshot {
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    pub rows: usize,
}
