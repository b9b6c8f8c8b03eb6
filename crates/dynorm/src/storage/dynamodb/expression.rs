//! Expression rendering.
//!
//! Key conditions, filters and projections are rendered into the service's expression
//! syntax. Every attribute name goes through a `#nN` placeholder and every operand through
//! a `:vN` placeholder, so reserved words and special characters never reach the parser.

use std::collections::HashMap;

use dynorm_core::storage::{Comparison, Condition, KeyCondition, SortCondition};
use dynorm_core::value::AttributeValue;

/// Collects placeholders while expressions are rendered.
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl ExpressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn name(&mut self, attribute: &str) -> String {
        if let Some((placeholder, _)) = self.names.iter().find(|(_, name)| *name == attribute) {
            return placeholder.clone();
        }
        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    fn value(&mut self, value: &AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value.clone());
        placeholder
    }

    /// Renders `partition = :v [AND <sort condition>]`.
    pub fn key_condition(&mut self, condition: &KeyCondition) -> String {
        let (partition, value) = &condition.partition;
        let mut expression = format!("{} = {}", self.name(partition), self.value(value));
        if let Some((sort, sort_condition)) = &condition.sort {
            expression.push_str(" AND ");
            expression.push_str(&self.sort_condition(sort, sort_condition));
        }
        expression
    }

    fn sort_condition(
        &mut self,
        attribute: &str,
        condition: &SortCondition<AttributeValue>,
    ) -> String {
        let name = self.name(attribute);
        match condition {
            SortCondition::Eq(v) => format!("{name} = {}", self.value(v)),
            SortCondition::Lt(v) => format!("{name} < {}", self.value(v)),
            SortCondition::Le(v) => format!("{name} <= {}", self.value(v)),
            SortCondition::Gt(v) => format!("{name} > {}", self.value(v)),
            SortCondition::Ge(v) => format!("{name} >= {}", self.value(v)),
            SortCondition::Between(lo, hi) => {
                let lo = self.value(lo);
                format!("{name} BETWEEN {lo} AND {}", self.value(hi))
            }
            SortCondition::BeginsWith(v) => format!("begins_with({name}, {})", self.value(v)),
        }
    }

    /// Renders the conjunction of `filters`, or `None` when there are none.
    pub fn filter(&mut self, filters: &[Condition<AttributeValue>]) -> Option<String> {
        if filters.is_empty() {
            return None;
        }
        let clauses: Vec<String> = filters.iter().map(|c| self.condition(c)).collect();
        Some(clauses.join(" AND "))
    }

    fn condition(&mut self, condition: &Condition<AttributeValue>) -> String {
        let name = self.name(&condition.attribute);
        match &condition.comparison {
            Comparison::Eq(v) => format!("{name} = {}", self.value(v)),
            Comparison::Ne(v) => format!("{name} <> {}", self.value(v)),
            Comparison::Lt(v) => format!("{name} < {}", self.value(v)),
            Comparison::Le(v) => format!("{name} <= {}", self.value(v)),
            Comparison::Gt(v) => format!("{name} > {}", self.value(v)),
            Comparison::Ge(v) => format!("{name} >= {}", self.value(v)),
            Comparison::Between(lo, hi) => {
                let lo = self.value(lo);
                format!("{name} BETWEEN {lo} AND {}", self.value(hi))
            }
            Comparison::BeginsWith(v) => format!("begins_with({name}, {})", self.value(v)),
            Comparison::Contains(v) => format!("contains({name}, {})", self.value(v)),
            Comparison::Exists => format!("attribute_exists({name})"),
            Comparison::NotExists => format!("attribute_not_exists({name})"),
        }
    }

    /// Renders a projection list, or `None` to read every attribute.
    pub fn projection(&mut self, attributes: &[String]) -> Option<String> {
        if attributes.is_empty() {
            return None;
        }
        let names: Vec<String> = attributes.iter().map(|a| self.name(a)).collect();
        Some(names.join(", "))
    }

    /// Placeholder maps; `None` when empty, since the service rejects empty maps.
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> (
        Option<HashMap<String, String>>,
        Option<HashMap<String, AttributeValue>>,
    ) {
        let names = (!self.names.is_empty()).then_some(self.names);
        let values = (!self.values.is_empty()).then_some(self.values);
        (names, values)
    }
}
