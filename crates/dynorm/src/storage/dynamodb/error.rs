//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StorageError` from `dynorm_core::storage`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use dynorm_core::storage::StorageError;

/// Transport failures never reach the service, so they carry no service error.
fn transport_error<E, R>(err: &SdkError<E, R>) -> Option<StorageError> {
    match err {
        SdkError::DispatchFailure(failure) => {
            Some(StorageError::Connection(format!("Dispatch failure: {failure:?}")))
        }
        SdkError::TimeoutError(_) => {
            Some(StorageError::Connection("Request timed out".to_string()))
        }
        _ => None,
    }
}

fn throttled(message: &str) -> StorageError {
    StorageError::Throttled(message.to_string())
}

fn internal() -> StorageError {
    StorageError::Service("DynamoDB internal server error".to_string())
}

/// Map a GetItem SDK error to StorageError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
    table: &str,
) -> StorageError {
    if let Some(error) = transport_error(&err) {
        return error;
    }
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => {
            StorageError::TableNotFound(table.to_string())
        }
        GetItemError::ProvisionedThroughputExceededException(_) => {
            throttled("Throughput exceeded, please retry")
        }
        GetItemError::RequestLimitExceeded(_) => throttled("Request limit exceeded, please retry"),
        GetItemError::InternalServerError(_) => internal(),
        err => StorageError::Request(format!("GetItem failed: {:?}", err)),
    }
}

/// Map a BatchGetItem SDK error to StorageError.
pub fn map_batch_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchGetItemError, R>,
    table: &str,
) -> StorageError {
    if let Some(error) = transport_error(&err) {
        return error;
    }
    match err.into_service_error() {
        BatchGetItemError::ResourceNotFoundException(_) => {
            StorageError::TableNotFound(table.to_string())
        }
        BatchGetItemError::ProvisionedThroughputExceededException(_) => {
            throttled("Throughput exceeded, please retry")
        }
        BatchGetItemError::RequestLimitExceeded(_) => {
            throttled("Request limit exceeded, please retry")
        }
        BatchGetItemError::InternalServerError(_) => internal(),
        err => StorageError::Request(format!("BatchGetItem failed: {:?}", err)),
    }
}

/// Map a Query SDK error to StorageError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
    table: &str,
) -> StorageError {
    if let Some(error) = transport_error(&err) {
        return error;
    }
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => StorageError::TableNotFound(table.to_string()),
        QueryError::ProvisionedThroughputExceededException(_) => {
            throttled("Throughput exceeded, please retry")
        }
        QueryError::RequestLimitExceeded(_) => throttled("Request limit exceeded, please retry"),
        QueryError::InternalServerError(_) => internal(),
        err => StorageError::Request(format!("Query failed: {:?}", err)),
    }
}

/// Map a Scan SDK error to StorageError.
pub fn map_scan_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<ScanError, R>,
    table: &str,
) -> StorageError {
    if let Some(error) = transport_error(&err) {
        return error;
    }
    match err.into_service_error() {
        ScanError::ResourceNotFoundException(_) => StorageError::TableNotFound(table.to_string()),
        ScanError::ProvisionedThroughputExceededException(_) => {
            throttled("Throughput exceeded, please retry")
        }
        ScanError::RequestLimitExceeded(_) => throttled("Request limit exceeded, please retry"),
        ScanError::InternalServerError(_) => internal(),
        err => StorageError::Request(format!("Scan failed: {:?}", err)),
    }
}

/// Map a PutItem SDK error to StorageError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    table: &str,
) -> StorageError {
    if let Some(error) = transport_error(&err) {
        return error;
    }
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(e) => {
            StorageError::ConditionFailed(e.message().unwrap_or("PutItem condition").to_string())
        }
        PutItemError::ResourceNotFoundException(_) => {
            StorageError::TableNotFound(table.to_string())
        }
        PutItemError::ProvisionedThroughputExceededException(_) => {
            throttled("Throughput exceeded, please retry")
        }
        PutItemError::RequestLimitExceeded(_) => throttled("Request limit exceeded, please retry"),
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            StorageError::Request("Item collection size limit exceeded".to_string())
        }
        PutItemError::TransactionConflictException(_) => {
            throttled("Transaction conflict, please retry")
        }
        PutItemError::InternalServerError(_) => internal(),
        err => StorageError::Request(format!("PutItem failed: {:?}", err)),
    }
}

/// Map an UpdateItem SDK error to StorageError.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
    table: &str,
) -> StorageError {
    if let Some(error) = transport_error(&err) {
        return error;
    }
    match err.into_service_error() {
        UpdateItemError::ConditionalCheckFailedException(e) => StorageError::ConditionFailed(
            e.message().unwrap_or("UpdateItem condition").to_string(),
        ),
        UpdateItemError::ResourceNotFoundException(_) => {
            StorageError::TableNotFound(table.to_string())
        }
        UpdateItemError::ProvisionedThroughputExceededException(_) => {
            throttled("Throughput exceeded, please retry")
        }
        UpdateItemError::RequestLimitExceeded(_) => {
            throttled("Request limit exceeded, please retry")
        }
        UpdateItemError::ItemCollectionSizeLimitExceededException(_) => {
            StorageError::Request("Item collection size limit exceeded".to_string())
        }
        UpdateItemError::TransactionConflictException(_) => {
            throttled("Transaction conflict, please retry")
        }
        UpdateItemError::InternalServerError(_) => internal(),
        err => StorageError::Request(format!("UpdateItem failed: {:?}", err)),
    }
}

/// Map a DeleteItem SDK error to StorageError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    table: &str,
) -> StorageError {
    if let Some(error) = transport_error(&err) {
        return error;
    }
    match err.into_service_error() {
        DeleteItemError::ConditionalCheckFailedException(e) => StorageError::ConditionFailed(
            e.message().unwrap_or("DeleteItem condition").to_string(),
        ),
        DeleteItemError::ResourceNotFoundException(_) => {
            StorageError::TableNotFound(table.to_string())
        }
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            throttled("Throughput exceeded, please retry")
        }
        DeleteItemError::RequestLimitExceeded(_) => {
            throttled("Request limit exceeded, please retry")
        }
        DeleteItemError::ItemCollectionSizeLimitExceededException(_) => {
            StorageError::Request("Item collection size limit exceeded".to_string())
        }
        DeleteItemError::TransactionConflictException(_) => {
            throttled("Transaction conflict, please retry")
        }
        DeleteItemError::InternalServerError(_) => internal(),
        err => StorageError::Request(format!("DeleteItem failed: {:?}", err)),
    }
}

/// Map a DescribeTable SDK error to StorageError.
pub fn map_describe_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DescribeTableError, R>,
    table: &str,
) -> StorageError {
    if let Some(error) = transport_error(&err) {
        return error;
    }
    match err.into_service_error() {
        DescribeTableError::ResourceNotFoundException(_) => {
            StorageError::TableNotFound(table.to_string())
        }
        DescribeTableError::InternalServerError(_) => internal(),
        err => StorageError::Request(format!("DescribeTable failed: {:?}", err)),
    }
}

/// Map a request-building error to StorageError.
pub fn map_build_error(err: impl std::fmt::Display) -> StorageError {
    StorageError::Request(err.to_string())
}
