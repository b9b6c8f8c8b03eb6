use serde::{Deserialize, Serialize};

use crate::value::{AttributeValue, Item};

/// Service-reported capacity usage, passed through unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsumedCapacity {
    pub table_name: Option<String>,
    pub capacity_units: Option<f64>,
}

/// A per-attribute directive of an update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeUpdate {
    /// Write the value.
    Put(AttributeValue),
    /// Remove the attribute from the item.
    Delete,
}

/// A condition on the sort key of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SortCondition<V> {
    Eq(V),
    Lt(V),
    Le(V),
    Gt(V),
    Ge(V),
    Between(V, V),
    BeginsWith(V),
}

impl<V> SortCondition<V> {
    /// Converts the operand(s), stopping at the first error.
    pub fn try_map<W, E>(
        self,
        mut f: impl FnMut(V) -> Result<W, E>,
    ) -> Result<SortCondition<W>, E> {
        Ok(match self {
            SortCondition::Eq(v) => SortCondition::Eq(f(v)?),
            SortCondition::Lt(v) => SortCondition::Lt(f(v)?),
            SortCondition::Le(v) => SortCondition::Le(f(v)?),
            SortCondition::Gt(v) => SortCondition::Gt(f(v)?),
            SortCondition::Ge(v) => SortCondition::Ge(f(v)?),
            SortCondition::Between(lo, hi) => SortCondition::Between(f(lo)?, f(hi)?),
            SortCondition::BeginsWith(v) => SortCondition::BeginsWith(f(v)?),
        })
    }
}

/// A comparison used by query and scan filters.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison<V> {
    Eq(V),
    Ne(V),
    Lt(V),
    Le(V),
    Gt(V),
    Ge(V),
    Between(V, V),
    BeginsWith(V),
    Contains(V),
    Exists,
    NotExists,
}

impl<V> Comparison<V> {
    /// Converts the operand(s), stopping at the first error.
    pub fn try_map<W, E>(self, mut f: impl FnMut(V) -> Result<W, E>) -> Result<Comparison<W>, E> {
        Ok(match self {
            Comparison::Eq(v) => Comparison::Eq(f(v)?),
            Comparison::Ne(v) => Comparison::Ne(f(v)?),
            Comparison::Lt(v) => Comparison::Lt(f(v)?),
            Comparison::Le(v) => Comparison::Le(f(v)?),
            Comparison::Gt(v) => Comparison::Gt(f(v)?),
            Comparison::Ge(v) => Comparison::Ge(f(v)?),
            Comparison::Between(lo, hi) => Comparison::Between(f(lo)?, f(hi)?),
            Comparison::BeginsWith(v) => Comparison::BeginsWith(f(v)?),
            Comparison::Contains(v) => Comparison::Contains(f(v)?),
            Comparison::Exists => Comparison::Exists,
            Comparison::NotExists => Comparison::NotExists,
        })
    }
}

/// A filter on a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition<V> {
    pub attribute: String,
    pub comparison: Comparison<V>,
}

/// The key condition of a query: partition equality plus an optional sort condition.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    pub partition: (String, AttributeValue),
    pub sort: Option<(String, SortCondition<AttributeValue>)>,
}

/// Options forwarded to the service's native query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub index_name: Option<String>,
    pub key_condition: KeyCondition,
    pub filters: Vec<Condition<AttributeValue>>,
    pub limit: Option<u32>,
    pub exclusive_start_key: Option<Item>,
    pub scan_index_forward: bool,
    pub consistent_read: bool,
    pub projection: Vec<String>,
}

impl QueryOptions {
    /// Forward, unlimited query for the given key condition.
    pub fn new(key_condition: KeyCondition) -> Self {
        Self {
            index_name: None,
            key_condition,
            filters: Vec::new(),
            limit: None,
            exclusive_start_key: None,
            scan_index_forward: true,
            consistent_read: false,
            projection: Vec::new(),
        }
    }
}

/// Options forwarded to the service's native scan.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanOptions {
    pub index_name: Option<String>,
    pub filters: Vec<Condition<AttributeValue>>,
    pub limit: Option<u32>,
    pub exclusive_start_key: Option<Item>,
    pub consistent_read: bool,
    pub projection: Vec<String>,
    /// `(segment, total_segments)` for parallel scans.
    pub segment: Option<(u32, u32)>,
}

/// One page of a query or scan.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageOutput {
    pub items: Vec<Item>,
    pub count: usize,
    pub last_evaluated_key: Option<Item>,
    pub consumed_capacity: Vec<ConsumedCapacity>,
}

/// One round of a batch read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchGetOutput {
    pub items: Vec<Item>,
    pub unprocessed_keys: Vec<Item>,
    pub consumed_capacity: Vec<ConsumedCapacity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_condition_try_map_between() {
        let condition = SortCondition::Between(1, 5);
        let mapped: Result<SortCondition<String>, ()> = condition.try_map(|v| Ok(v.to_string()));
        assert_eq!(
            mapped,
            Ok(SortCondition::Between("1".to_string(), "5".to_string()))
        );
    }

    #[test]
    fn test_comparison_try_map_stops_on_error() {
        let comparison = Comparison::Between(1, -1);
        let mapped: Result<Comparison<u32>, String> =
            comparison.try_map(|v| u32::try_from(v).map_err(|_| format!("negative: {v}")));
        assert_eq!(mapped, Err("negative: -1".to_string()));
    }

    #[test]
    fn test_query_options_default_forward() {
        let options = QueryOptions::new(KeyCondition {
            partition: ("id".to_string(), AttributeValue::S("a".to_string())),
            sort: None,
        });
        assert!(options.scan_index_forward);
        assert!(!options.consistent_read);
    }
}
