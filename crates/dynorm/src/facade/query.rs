use std::sync::Arc;

use dynorm_core::key::ValidationError;
use dynorm_core::response::PaginatedResponse;
use dynorm_core::schema::KeySchema;
use dynorm_core::storage::{Comparison, Condition, KeyCondition, QueryOptions, SortCondition};
use dynorm_core::value::{Item, Value};
use dynorm_core::Result;

use super::{coerce_filters, StartKey};
use crate::collection::Collection;

/// Fluent builder for a key-condition query against a table or one of its indexes.
///
/// A partition key equality is required. Nothing is validated until [`execute`] or
/// [`fetch_all`] runs; the builder can be executed any number of times.
///
/// [`execute`]: QueryBuilder::execute
/// [`fetch_all`]: QueryBuilder::fetch_all
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    collection: Arc<Collection>,
    index: Option<String>,
    partition: Option<(String, Value)>,
    sort: Option<(String, SortCondition<Value>)>,
    filters: Vec<Condition<Value>>,
    limit: Option<u32>,
    descending: bool,
    consistent_read: bool,
    projection: Vec<String>,
    start: Option<StartKey>,
}

impl QueryBuilder {
    pub fn new(collection: Arc<Collection>) -> Self {
        Self {
            collection,
            index: None,
            partition: None,
            sort: None,
            filters: Vec::new(),
            limit: None,
            descending: false,
            consistent_read: false,
            projection: Vec::new(),
            start: None,
        }
    }

    /// Queries a secondary index instead of the table.
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    /// Sets the partition key equality.
    pub fn key_eq(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.partition = Some((attribute.into(), value.into()));
        self
    }

    /// Sets the sort key condition.
    pub fn sort(mut self, attribute: impl Into<String>, condition: SortCondition<Value>) -> Self {
        self.sort = Some((attribute.into(), condition));
        self
    }

    /// Adds a filter, applied by the service after the key condition.
    pub fn filter(mut self, attribute: impl Into<String>, comparison: Comparison<Value>) -> Self {
        self.filters.push(Condition {
            attribute: attribute.into(),
            comparison,
        });
        self
    }

    /// Maximum number of items evaluated per page.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Reads in descending sort key order.
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    /// Restricts the attributes returned.
    pub fn project<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Resumes after the given storage key.
    pub fn start_from(mut self, key: Item) -> Self {
        self.start = Some(StartKey::Key(key));
        self
    }

    /// Resumes where `response` stopped; a finished response restarts from the beginning.
    pub fn resume(mut self, response: &PaginatedResponse) -> Self {
        self.start = response.last_evaluated_key.clone().map(StartKey::Key);
        self
    }

    /// Resumes from an encoded cursor, see [`dynorm_core::response::encode_cursor`].
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
            "Query finished"
        );
        Ok(response)
    }

    async fn page(
        &self,
        start: Option<Item>,
        previous: Option<PaginatedResponse>,
    ) -> Result<PaginatedResponse> {
        let options = self.options(start).await?;
        self.collection.query(options, previous).await
    }

    async fn options(&self, start: Option<Item>) -> Result<QueryOptions> {
        let schema = self.collection.key_schema(self.index.as_deref()).await?;
        let key_condition = self.key_condition(&schema)?;

        Ok(QueryOptions {
            index_name: self.index.clone(),
            key_condition,
            filters: coerce_filters(&self.collection, &self.filters)?,
            limit: self.limit,
            exclusive_start_key: start,
            scan_index_forward: !self.descending,
            consistent_read: self.consistent_read,
            projection: self.projection.clone(),
        })
    }

    /// Checks the key attributes against `schema` and marshals their operands.
    fn key_condition(&self, schema: &KeySchema) -> Result<KeyCondition> {
        let partition_key = schema.partition_key().unwrap_or_default();
        let (attribute, value) = match &self.partition {
            Some((attribute, value)) if attribute == partition_key => (attribute, value),
            _ => {
                return Err(ValidationError::MissingKeyAttribute {
                    attribute: partition_key.to_string(),
                }
                .into())
            }
        };
        if value.is_empty() {
            return Err(ValidationError::EmptyKeyComponent {
                attribute: attribute.clone(),
            }
            .into());
        }
        let partition = (attribute.clone(), self.collection.serialize_value(attribute, value)?);

        let sort = match &self.sort {
            None => None,
            Some((attribute, condition)) => {
                if schema.sort_key() != Some(attribute.as_str()) {
                    return Err(ValidationError::MissingKeyAttribute {
                        attribute: schema.sort_key().unwrap_or(attribute).to_string(),
                    }
                    .into());
                }
                let condition = condition
                    .clone()
                    .try_map(|value| self.collection.serialize_value(attribute, &value))?;
                Some((attribute.clone(), condition))
            }
        };

        Ok(KeyCondition { partition, sort })
    }
}
