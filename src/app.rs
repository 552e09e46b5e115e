use crate::data::{SavedSnapshot, Snapshot};
use crate::paginator::fetch_all_listings;
use crate::persistence::SnapshotStore;
use crate::reservoir::{ListingsQuery, OrdersApi};
use log::{info, warn};

pub struct App<S: OrdersApi, P: SnapshotStore> {
    source: S,
    store: P,
    page_limit: u32,
}

impl<S: OrdersApi, P: SnapshotStore> App<S, P> {
    pub fn new(source: S, store: P, page_limit: u32) -> Self {
        Self {
            source,
            store,
            page_limit,
        }
    }

    /// Capture every active listing of `contract` and persist the snapshot.
    pub async fn run(&self, contract: &str) -> anyhow::Result<SavedSnapshot> {
        let query = ListingsQuery {
            contract: contract.to_string(),
            limit: self.page_limit,
        };

        info!("Fetching listings for {contract}...");
        let pagination = fetch_all_listings(&self.source, &query).await?;
        if let Some(status) = pagination.rejected {
            warn!(
                "Snapshot is incomplete: page {} was rejected with {status}, saving {} listings fetched before it",
                pagination.pages,
                pagination.listings.len()
            );
        }

        let snapshot = Snapshot {
            captured_at: chrono::Local::now(),
            contract: query.contract,
            listings: pagination.listings,
        };

        let saved = self.store.save_snapshot(&snapshot).await?;
        info!(
            "Saved {} listings for {} across {} pages",
            saved.rows, snapshot.contract, pagination.pages
        );

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OrdersPage;
    use crate::reservoir::PageResponse;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tracing_unwrap::ResultExt;

    struct MockApi {
        pages: Vec<PageResponse>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl OrdersApi for MockApi {
        async fn fetch_page(
            &self,
            query: &ListingsQuery,
            _continuation: Option<&str>,
        ) -> anyhow::Result<PageResponse> {
            assert_eq!(query.contract, "0xcontract");
            assert_eq!(query.limit, 1000);
            let mut calls = self.calls.lock().await;
            let page = self
                .pages
                .get(*calls)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Unexpected page request"))?;
            *calls += 1;
            Ok(page)
        }
    }

    struct MockStore {
        saved: Arc<Mutex<Vec<Snapshot>>>,
        fail: bool,
    }

    #[async_trait]
    impl SnapshotStore for MockStore {
        async fn save_snapshot(&self, snapshot: &Snapshot) -> anyhow::Result<SavedSnapshot> {
            if self.fail {
                return Err(anyhow::anyhow!("Failed to save"));
            }
            self.saved.lock().await.push(snapshot.clone());
            Ok(SavedSnapshot {
                csv_path: PathBuf::from("out.csv"),
                json_path: PathBuf::from("out.json"),
                rows: snapshot.listings.len(),
            })
        }
    }

    fn page(ids: &[&str], continuation: Option<&str>) -> PageResponse {
        PageResponse::Page(OrdersPage {
            orders: Some(ids.iter().map(|id| json!({ "id": id })).collect()),
            continuation: continuation.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_run_saves_all_pages() {
        let api = MockApi {
            pages: vec![page(&["a", "b"], Some("abc")), page(&["c"], None)],
            calls: Mutex::new(0),
        };
        let saved = Arc::new(Mutex::new(vec![]));
        let store = MockStore {
            saved: saved.clone(),
            fail: false,
        };
        let app = App::new(api, store, 1000);

        let result = app.run("0xcontract").await.unwrap_or_log();

        assert_eq!(result.rows, 3);
        let saved = saved.lock().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].contract, "0xcontract");
        assert_eq!(saved[0].listings.len(), 3);
        assert_eq!(saved[0].listings[2]["id"], "c");
    }

    #[tokio::test]
    async fn test_run_saves_partial_snapshot_on_rejection() {
        let api = MockApi {
            pages: vec![
                page(&["a"], Some("x")),
                PageResponse::Rejected(StatusCode::INTERNAL_SERVER_ERROR),
            ],
            calls: Mutex::new(0),
        };
        let saved = Arc::new(Mutex::new(vec![]));
        let store = MockStore {
            saved: saved.clone(),
            fail: false,
        };
        let app = App::new(api, store, 1000);

        let result = app.run("0xcontract").await.unwrap_or_log();

        assert_eq!(result.rows, 1);
        assert_eq!(*app.source.calls.lock().await, 2);
        assert_eq!(saved.lock().await[0].listings.len(), 1);
    }

    #[tokio::test]
    async fn test_run_propagates_store_failure() {
        let api = MockApi {
            pages: vec![page(&["a"], None)],
            calls: Mutex::new(0),
        };
        let store = MockStore {
            saved: Arc::new(Mutex::new(vec![])),
            fail: true,
        };
        let app = App::new(api, store, 1000);

        assert!(app.run("0xcontract").await.is_err());
    }
}
