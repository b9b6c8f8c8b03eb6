//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of `StorageClient` using
//! `aws-sdk-dynamodb`.

mod client;
mod conversions;
mod error;
mod expression;

pub use client::DynamoDbClient;
pub use expression::ExpressionBuilder;
