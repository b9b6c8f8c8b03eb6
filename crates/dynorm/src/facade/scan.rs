use std::sync::Arc;

use dynorm_core::response::PaginatedResponse;
use dynorm_core::storage::{Comparison, Condition, ScanOptions};
use dynorm_core::value::{Item, Value};
use dynorm_core::Result;

use super::{coerce_filters, StartKey};
use crate::collection::Collection;

/// Fluent builder for a full-table (or index) scan.
#[derive(Debug, Clone)]
pub struct ScanBuilder {
    collection: Arc<Collection>,
    index: Option<String>,
    filters: Vec<Condition<Value>>,
    limit: Option<u32>,
    consistent_read: bool,
    projection: Vec<String>,
    segment: Option<(u32, u32)>,
    start: Option<StartKey>,
}

impl ScanBuilder {
    pub fn new(collection: Arc<Collection>) -> Self {
        Self {
            collection,
            index: None,
            filters: Vec::new(),
            limit: None,
            consistent_read: false,
            projection: Vec::new(),
            segment: None,
            start: None,
        }
    }

    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    pub fn filter(mut self, attribute: impl Into<String>, comparison: Comparison<Value>) -> Self {
        self.filters.push(Condition {
            attribute: attribute.into(),
            comparison,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    pub fn project<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Reads only `segment` of `total` disjoint segments, for parallel scans.
    pub fn segment(mut self, segment: u32, total: u32) -> Self {
        self.segment = Some((segment, total));
        self
    }

    pub fn start_from(mut self, key: Item) -> Self {
        self.start = Some(StartKey::Key(key));
        self
    }

    pub fn resume(mut self, response: &PaginatedResponse) -> Self {
        self.start = response.last_evaluated_key.clone().map(StartKey::Key);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.start = Some(StartKey::Cursor(cursor.into()));
        self
    }

    /// Reads one page.
    pub async fn execute(&self) -> Result<PaginatedResponse> {
        let start = self.start.clone().map(StartKey::into_item).transpose()?;
        self.page(start, None).await
    }

    /// Reads pages until the service reports no more, or `max_pages` have been read.
    pub async fn fetch_all(&self, max_pages: usize) -> Result<PaginatedResponse> {
        let mut start = self.start.clone().map(StartKey::into_item).transpose()?;
        let mut response = self.page(start, None).await?;
        let mut pages = 1;

        while response.has_more() && pages < max_pages {
            start = response.last_evaluated_key.clone();
            response = self.page(start, Some(response)).await?;
            pages += 1;
        }

        tracing::debug!(
            collection = %self.collection.name(),
            pages,
            count = response.count,
            "Scan finished"
        );
        Ok(response)
    }

    async fn page(
        &self,
        start: Option<Item>,
        previous: Option<PaginatedResponse>,
    ) -> Result<PaginatedResponse> {
        let options = ScanOptions {
            index_name: self.index.clone(),
            filters: coerce_filters(&self.collection, &self.filters)?,
            limit: self.limit,
            exclusive_start_key: start,
            consistent_read: self.consistent_read,
            projection: self.projection.clone(),
            segment: self.segment,
        };
        self.collection.scan(options, previous).await
    }
}
