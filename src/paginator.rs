//! Walks the continuation chain of the asks endpoint and gathers every page
//! into one ordered list.

use log::{error, info, warn};
use reqwest::StatusCode;

use crate::data::Listing;
use crate::reservoir::{ListingsQuery, OrdersApi, PageResponse};

/// Everything collected by one pass over the continuation chain.
#[derive(Clone, Debug, Default)]
pub struct Pagination {
    /// Listings in the order the server delivered them.
    pub listings: Vec<Listing>,
    /// Number of page requests issued, including a rejected one.
    pub pages: usize,
    /// Set when the chain was cut short by a non-200 response.
    pub rejected: Option<StatusCode>,
}

/// Fetch pages until the server stops handing out continuation tokens.
///
/// A rejected page ends the walk without failing it: whatever was fetched
/// before the rejection is returned with [`Pagination::rejected`] set.
/// Transport and decoding errors are returned as errors.
pub async fn fetch_all_listings(
    api: &impl OrdersApi,
    query: &ListingsQuery,
) -> anyhow::Result<Pagination> {
    let mut pagination = Pagination::default();
    let mut continuation: Option<String> = None;

    loop {
        let response = api.fetch_page(query, continuation.as_deref()).await?;
        pagination.pages += 1;

        let page = match response {
            PageResponse::Page(page) => page,
            PageResponse::Rejected(status) => {
                error!("API request failed with status code {status}");
                pagination.rejected = Some(status);
                break;
            }
        };

        continuation = page.next_continuation().map(str::to_string);

        match page.orders {
            Some(orders) => {
                let fetched = orders.len();
                pagination.listings.extend(orders);
                info!(
                    "Fetched {fetched} listings ({} total)",
                    pagination.listings.len()
                );
            }
            None => warn!("Page {} carried no orders", pagination.pages),
        }

        if continuation.is_none() {
            break;
        }
    }

    Ok(pagination)
}
