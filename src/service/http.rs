//! JSON-over-HTTP implementation of [`LogService`].
//!
//! The client itself is async `reqwest`. The trait is blocking, so each call
//! is driven to completion on the runtime captured at construction time via
//! `Handle::block_on`. Calls must therefore come from worker threads
//! (`spawn_blocking`, `std::thread`), never from inside an async task.

use std::time::Duration;

use log::{debug, warn};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::runtime::Handle;

use crate::core::model::{CollectionRef, Cursor, DetailEntry, ItemRef, Page};
use crate::service::{LogService, ServiceError};

/// Page size requested when listing streams.
const ITEMS_PAGE_LIMIT: &str = "50";
/// Largest event page the service hands out.
const ENTRIES_PAGE_LIMIT: &str = "10000";

pub struct HttpLogService {
    client: Client,
    base_url: Url,
    token: Option<String>,
    runtime: Handle,
}

#[derive(Serialize)]
struct CreateItemBody<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct PutEntriesBody<'a> {
    entries: &'a [DetailEntry],
}

impl HttpLogService {
    /// Build a client for `base_url`.
    ///
    /// Must be called from within a tokio runtime; its handle drives every
    /// later call.
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let runtime = Handle::try_current()
            .map_err(|e| ServiceError::Config(format!("no async runtime: {e}")))?;
        Self::with_runtime(base_url, token, timeout, runtime)
    }

    pub fn with_runtime(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
        runtime: Handle,
    ) -> Result<Self, ServiceError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ServiceError::Config(format!("invalid endpoint '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::Config(format!(
                "endpoint '{base_url}' cannot be used as a base URL"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            token,
            runtime,
        })
    }

    /// Base URL with `segments` appended, each percent-encoded on its own.
    ///
    /// Group names contain slashes (`/aws/lambda/fn`), so they must never be
    /// joined into the path as raw text.
    fn url(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ServiceError::Config("endpoint cannot be a base".to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ServiceError> {
        debug!("GET {}", url);
        let request = self.authorize(self.client.get(url));
        self.runtime.block_on(async move {
            let response = request.send().await.map_err(map_transport_error)?;
            let response = check_status(response).await?;
            response
                .json::<T>()
                .await
                .map_err(|e| ServiceError::Parse(e.to_string()))
        })
    }

    fn post_json<B: Serialize>(&self, url: Url, body: &B) -> Result<StatusCode, ServiceError> {
        debug!("POST {}", url);
        let request = self.authorize(self.client.post(url)).json(body);
        self.runtime.block_on(async move {
            let response = request.send().await.map_err(map_transport_error)?;
            let status = response.status();
            if status == StatusCode::CONFLICT {
                return Ok(status);
            }
            check_status(response).await.map(|r| r.status())
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Network(e.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    warn!("Service returned HTTP {}: {}", status.as_u16(), message);
    if status == StatusCode::REQUEST_TIMEOUT {
        return Err(ServiceError::Timeout);
    }
    Err(ServiceError::Api {
        status: status.as_u16(),
        message,
    })
}

fn with_cursor(mut url: Url, cursor: Option<&Cursor>) -> Url {
    if let Some(cursor) = cursor {
        url.query_pairs_mut().append_pair("cursor", cursor.as_str());
    }
    url
}

impl LogService for HttpLogService {
    fn list_collections(&self, cursor: Option<&Cursor>) -> Result<Page<CollectionRef>, ServiceError> {
        let url = with_cursor(self.url(&["collections"])?, cursor);
        self.get_json(url)
    }

    fn list_items(
        &self,
        collection_id: &str,
        cursor: Option<&Cursor>,
    ) -> Result<Page<ItemRef>, ServiceError> {
        let mut url = self.url(&["collections", collection_id, "items"])?;
        url.query_pairs_mut()
            .append_pair("limit", ITEMS_PAGE_LIMIT)
            .append_pair("order", "last_activity_desc");
        self.get_json(with_cursor(url, cursor))
    }

    fn detail_page(
        &self,
        collection_id: &str,
        item_id: &str,
        cursor: Option<&Cursor>,
        start_from_earliest: bool,
    ) -> Result<Page<DetailEntry>, ServiceError> {
        let mut url = self.url(&["collections", collection_id, "items", item_id, "entries"])?;
        url.query_pairs_mut()
            .append_pair("from", if start_from_earliest { "earliest" } else { "latest" })
            .append_pair("limit", ENTRIES_PAGE_LIMIT);
        self.get_json(with_cursor(url, cursor))
    }

    fn detail_since(
        &self,
        collection_id: &str,
        item_id: &str,
        since: i64,
    ) -> Result<Vec<DetailEntry>, ServiceError> {
        let mut url = self.url(&["collections", collection_id, "items", item_id, "entries"])?;
        url.query_pairs_mut().append_pair("since", &since.to_string());
        let page: Page<DetailEntry> = self.get_json(url)?;
        Ok(page.items)
    }

    fn ensure_item(&self, collection_id: &str, item_id: &str) -> Result<(), ServiceError> {
        let url = self.url(&["collections", collection_id, "items"])?;
        let status = self.post_json(url, &CreateItemBody { id: item_id })?;
        if status == StatusCode::CONFLICT {
            debug!("Stream {} already exists in {}", item_id, collection_id);
        }
        Ok(())
    }

    fn put_entries(
        &self,
        collection_id: &str,
        item_id: &str,
        entries: &[DetailEntry],
    ) -> Result<(), ServiceError> {
        let url = self.url(&["collections", collection_id, "items", item_id, "entries"])?;
        self.post_json(url, &PutEntriesBody { entries })?;
        Ok(())
    }
}
