use anyhow::Context;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url};

use crate::data::OrdersPage;

const ASKS_PATH: &str = "/orders/asks/v5";

/// Parameters shared by every page request of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingsQuery {
    pub contract: String,
    pub limit: u32,
}

/// Outcome of a single page request.
#[derive(Clone, Debug)]
pub enum PageResponse {
    Page(OrdersPage),
    Rejected(StatusCode),
}

#[async_trait]
pub trait OrdersApi {
    async fn fetch_page(
        &self,
        query: &ListingsQuery,
        continuation: Option<&str>,
    ) -> anyhow::Result<PageResponse>;
}

pub struct ReservoirClient {
    client: Client,
    base_api_url: String,
    api_key: Option<String>,
}

impl ReservoirClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        if api_key.is_none() {
            warn!("No Reservoir API key configured, requests will be sent without x-api-key");
        }

        Self {
            client: Client::new(),
            base_api_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn page_url(&self, query: &ListingsQuery, continuation: Option<&str>) -> anyhow::Result<Url> {
        let base_url = &self.base_api_url;
        let mut url = Url::parse(&format!("{base_url}{ASKS_PATH}"))
            .with_context(|| format!("Invalid Reservoir API url {base_url}"))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("contracts", &query.contract)
                .append_pair("status", "active")
                .append_pair("sortBy", "updatedAt")
                .append_pair("limit", &query.limit.to_string());
            if let Some(token) = continuation {
                pairs.append_pair("continuation", token);
            }
        }

        Ok(url)
    }

    fn headers(&self) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        if let Some(api_key) = &self.api_key {
            let value = HeaderValue::from_str(api_key).context("API key is not a valid header value")?;
            headers.insert("x-api-key", value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl OrdersApi for ReservoirClient {
    async fn fetch_page(
        &self,
        query: &ListingsQuery,
        continuation: Option<&str>,
    ) -> anyhow::Result<PageResponse> {
        let url = self.page_url(query, continuation)?;
        debug!("GET {url}");

        let response = self
            .client
            .get(url.clone())
            .headers(self.headers()?)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(PageResponse::Rejected(status));
        }

        let page = response
            .json::<OrdersPage>()
            .await
            .with_context(|| format!("Can't decode orders page from {url}"))?;

        Ok(PageResponse::Page(page))
    }
}
