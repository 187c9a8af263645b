use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::{error::ClientError, DocumentClient, FeedOptions};

/// Forward-only pager over a query's result feed.
///
/// Each call to [`execute_next`](Self::execute_next) fetches one page; the
/// service's continuation token decides whether another page exists. Pages
/// are not restartable: once consumed, the iterator can only move forward.
pub struct QueryIterator<T> {
    client: DocumentClient,
    parent_link: String,
    resource_type: &'static str,
    envelope: &'static str,
    query: Value,
    options: FeedOptions,
    continuation: Option<String>,
    started: bool,
    _items: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> QueryIterator<T> {
    pub(crate) fn new(
        client: DocumentClient,
        parent_link: String,
        resource_type: &'static str,
        envelope: &'static str,
        sql: &str,
        options: FeedOptions,
    ) -> Self {
        Self {
            client,
            parent_link,
            resource_type,
            envelope,
            query: json!({ "query": sql, "parameters": [] }),
            options,
            continuation: None,
            started: false,
            _items: PhantomData,
        }
    }

    pub fn has_more_results(&self) -> bool {
        !self.started || self.continuation.is_some()
    }

    /// Fetch the next page of results. Errors if the feed is exhausted.
    pub async fn execute_next(&mut self) -> Result<Vec<T>, ClientError> {
        if !self.has_more_results() {
            return Err(ClientError::IteratorExhausted);
        }

        let (items, continuation) = self
            .client
            .execute_query_page(
                &self.parent_link,
                self.resource_type,
                self.envelope,
                &self.query,
                &self.options,
                self.continuation.take(),
            )
            .await?;

        self.started = true;
        self.continuation = continuation;

        items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(ClientError::Decode))
            .collect()
    }

    /// Drain every remaining page into one vector.
    pub async fn collect_all(mut self) -> Result<Vec<T>, ClientError> {
        let mut all = Vec::new();
        while self.has_more_results() {
            all.extend(self.execute_next().await?);
        }
        Ok(all)
    }
}
