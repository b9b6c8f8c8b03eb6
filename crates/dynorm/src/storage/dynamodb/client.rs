//! DynamoDB storage client.
//!
//! Implements `StorageClient` from `dynorm_core::storage` on top of `aws-sdk-dynamodb`.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeAction, AttributeValueUpdate, KeysAndAttributes, ReturnConsumedCapacity,
};
use aws_sdk_dynamodb::Client;

use dynorm_core::schema::TableDescription;
use dynorm_core::storage::{
    AttributeUpdate, BatchGetOutput, PageOutput, QueryOptions, ScanOptions, StorageClient,
    StorageError,
};
use dynorm_core::value::Item;

use super::conversions::{
    from_sdk_capacity, from_sdk_item, from_sdk_items, from_sdk_table, to_sdk_item, to_sdk_value,
};
use super::error::{
    map_batch_get_item_error, map_build_error, map_delete_item_error, map_describe_table_error,
    map_get_item_error, map_put_item_error, map_query_error, map_scan_error, map_update_item_error,
};
use super::expression::ExpressionBuilder;
use crate::config::Config;

/// DynamoDB-backed storage client.
#[derive(Debug, Clone)]
pub struct DynamoDbClient {
    client: Client,
}

impl DynamoDbClient {
    /// Wraps an existing SDK client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a client from the AWS default credential chain, using the configured region
    /// and endpoint override (for local DynamoDB).
    pub async fn from_config(config: &Config) -> Self {
        let mut sdk_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            sdk_config_loader = sdk_config_loader.endpoint_url(endpoint);
        }

        let sdk_config = sdk_config_loader.load().await;
        Self::new(Client::new(&sdk_config))
    }
}

fn to_sdk_updates(
    updates: Vec<(String, AttributeUpdate)>,
) -> HashMap<String, AttributeValueUpdate> {
    updates
        .into_iter()
        .map(|(name, update)| {
            let update = match update {
                AttributeUpdate::Put(value) => AttributeValueUpdate::builder()
                    .action(AttributeAction::Put)
                    .value(to_sdk_value(value))
                    .build(),
                AttributeUpdate::Delete => AttributeValueUpdate::builder()
                    .action(AttributeAction::Delete)
                    .build(),
            };
            (name, update)
        })
        .collect()
}

fn to_sdk_values(
    values: Option<HashMap<String, dynorm_core::value::AttributeValue>>,
) -> Option<HashMap<String, aws_sdk_dynamodb::types::AttributeValue>> {
    values.map(to_sdk_item)
}

fn to_i32(limit: Option<u32>) -> Option<i32> {
    limit.map(|l| i32::try_from(l).unwrap_or(i32::MAX))
}

#[async_trait]
impl StorageClient for DynamoDbClient {
    async fn put_item(&self, table: &str, item: Item) -> Result<(), StorageError> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(to_sdk_item(item)))
            .send()
            .await
            .map_err(|e| map_put_item_error(e, table))?;

        Ok(())
    }

    async fn update_item(
        &self,
        table: &str,
        key: Item,
        updates: Vec<(String, AttributeUpdate)>,
    ) -> Result<(), StorageError> {
        let attribute_updates = to_sdk_updates(updates);

        self.client
            .update_item()
            .table_name(table)
            .set_key(Some(to_sdk_item(key)))
            .set_attribute_updates((!attribute_updates.is_empty()).then_some(attribute_updates))
            .send()
            .await
            .map_err(|e| map_update_item_error(e, table))?;

        Ok(())
    }

    async fn delete_item(&self, table: &str, key: Item) -> Result<(), StorageError> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(to_sdk_item(key)))
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, table))?;

        Ok(())
    }

    async fn get_item(
        &self,
        table: &str,
        key: Item,
        consistent_read: bool,
    ) -> Result<Option<Item>, StorageError> {
        let result = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(to_sdk_item(key)))
            .consistent_read(consistent_read)
            .send()
            .await
            .map_err(|e| map_get_item_error(e, table))?;

        result.item.map(from_sdk_item).transpose()
    }

    async fn batch_get_item(
        &self,
        table: &str,
        keys: Vec<Item>,
        consistent_read: bool,
    ) -> Result<BatchGetOutput, StorageError> {
        let request = KeysAndAttributes::builder()
            .set_keys(Some(keys.into_iter().map(to_sdk_item).collect()))
            .consistent_read(consistent_read)
            .build()
            .map_err(map_build_error)?;

        let result = self
            .client
            .batch_get_item()
            .request_items(table, request)
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(|e| map_batch_get_item_error(e, table))?;

        let mut items = Vec::new();
        for found in result.responses.unwrap_or_default().into_values() {
            items.extend(from_sdk_items(Some(found))?);
        }

        let mut unprocessed_keys = Vec::new();
        for pending in result.unprocessed_keys.unwrap_or_default().into_values() {
            for key in pending.keys {
                unprocessed_keys.push(from_sdk_item(key)?);
            }
        }

        Ok(BatchGetOutput {
            items,
            unprocessed_keys,
            consumed_capacity: result
                .consumed_capacity
                .unwrap_or_default()
                .into_iter()
                .map(from_sdk_capacity)
                .collect(),
        })
    }

    async fn query(&self, table: &str, options: QueryOptions) -> Result<PageOutput, StorageError> {
        let mut expressions = ExpressionBuilder::new();
        let key_condition = expressions.key_condition(&options.key_condition);
        let filter = expressions.filter(&options.filters);
        let projection = expressions.projection(&options.projection);
        let (names, values) = expressions.into_parts();

        let result = self
            .client
            .query()
            .table_name(table)
            .set_index_name(options.index_name)
            .key_condition_expression(key_condition)
            .set_filter_expression(filter)
            .set_projection_expression(projection)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(to_sdk_values(values))
            .set_limit(to_i32(options.limit))
            .set_exclusive_start_key(options.exclusive_start_key.map(to_sdk_item))
            .scan_index_forward(options.scan_index_forward)
            .consistent_read(options.consistent_read)
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(|e| map_query_error(e, table))?;

        Ok(PageOutput {
            count: usize::try_from(result.count).unwrap_or_default(),
            items: from_sdk_items(result.items)?,
            last_evaluated_key: result.last_evaluated_key.map(from_sdk_item).transpose()?,
            consumed_capacity: result
                .consumed_capacity
                .map(from_sdk_capacity)
                .into_iter()
                .collect(),
        })
    }

    async fn scan(&self, table: &str, options: ScanOptions) -> Result<PageOutput, StorageError> {
        let mut expressions = ExpressionBuilder::new();
        let filter = expressions.filter(&options.filters);
        let projection = expressions.projection(&options.projection);
        let (names, values) = expressions.into_parts();

        let (segment, total_segments) = match options.segment {
            Some((segment, total)) => (
                Some(i32::try_from(segment).map_err(map_build_error)?),
                Some(i32::try_from(total).map_err(map_build_error)?),
            ),
            None => (None, None),
        };

        let result = self
            .client
            .scan()
            .table_name(table)
            .set_index_name(options.index_name)
            .set_filter_expression(filter)
            .set_projection_expression(projection)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(to_sdk_values(values))
            .set_limit(to_i32(options.limit))
            .set_exclusive_start_key(options.exclusive_start_key.map(to_sdk_item))
            .consistent_read(options.consistent_read)
            .set_segment(segment)
            .set_total_segments(total_segments)
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(|e| map_scan_error(e, table))?;

        Ok(PageOutput {
            count: usize::try_from(result.count).unwrap_or_default(),
            items: from_sdk_items(result.items)?,
            last_evaluated_key: result.last_evaluated_key.map(from_sdk_item).transpose()?,
            consumed_capacity: result
                .consumed_capacity
                .map(from_sdk_capacity)
                .into_iter()
                .collect(),
        })
    }

    async fn describe_table(&self, table: &str) -> Result<TableDescription, StorageError> {
        let result = self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(|e| map_describe_table_error(e, table))?;

        result
            .table()
            .map(from_sdk_table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }
}
