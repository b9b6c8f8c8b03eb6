//! Condition evaluation over stored items.

use std::cmp::Ordering;

use dynorm_core::storage::{Comparison, Condition, SortCondition};
use dynorm_core::value::{AttributeValue, Item};

/// Orders two scalar attributes of the same type; `None` for mismatched or non-scalar types.
pub fn compare_attribute(left: &AttributeValue, right: &AttributeValue) -> Option<Ordering> {
    match (left, right) {
        (AttributeValue::S(a), AttributeValue::S(b)) => Some(a.cmp(b)),
        (AttributeValue::B(a), AttributeValue::B(b)) => Some(a.cmp(b)),
        (AttributeValue::N(a), AttributeValue::N(b)) => {
            match (a.parse::<i64>(), b.parse::<i64>()) {
                (Ok(a), Ok(b)) => Some(a.cmp(&b)),
                _ => a.parse::<f64>().ok()?.partial_cmp(&b.parse::<f64>().ok()?),
            }
        }
        _ => None,
    }
}

fn type_rank(value: &AttributeValue) -> u8 {
    match value {
        AttributeValue::S(_) => 0,
        AttributeValue::N(_) => 1,
        AttributeValue::B(_) => 2,
        _ => 3,
    }
}

/// Orders two key tuples component by component. Missing components sort first, and
/// components of different types order by type.
pub fn compare_keys(
    left: &[Option<&AttributeValue>],
    right: &[Option<&AttributeValue>],
) -> Ordering {
    for (a, b) in left.iter().zip(right) {
        let ordering = match (a, b) {
            (Some(a), Some(b)) => compare_attribute(a, b)
                .unwrap_or_else(|| type_rank(a).cmp(&type_rank(b))),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    left.len().cmp(&right.len())
}

fn equals(left: &AttributeValue, right: &AttributeValue) -> bool {
    compare_attribute(left, right).map_or(left == right, Ordering::is_eq)
}

fn begins_with(value: &AttributeValue, prefix: &AttributeValue) -> bool {
    match (value, prefix) {
        (AttributeValue::S(s), AttributeValue::S(p)) => s.starts_with(p.as_str()),
        (AttributeValue::B(b), AttributeValue::B(p)) => b.starts_with(p),
        _ => false,
    }
}

fn contains(value: &AttributeValue, operand: &AttributeValue) -> bool {
    match (value, operand) {
        (AttributeValue::S(s), AttributeValue::S(part)) => s.contains(part.as_str()),
        (AttributeValue::B(b), AttributeValue::B(part)) => {
            part.is_empty() || b.windows(part.len()).any(|w| w == part.as_slice())
        }
        (AttributeValue::L(items), operand) => items.iter().any(|item| equals(item, operand)),
        (AttributeValue::Ss(items), AttributeValue::S(s)) => items.contains(s),
        (AttributeValue::Ns(items), AttributeValue::N(_)) => items
            .iter()
            .any(|n| equals(&AttributeValue::N(n.clone()), operand)),
        (AttributeValue::Bs(items), AttributeValue::B(b)) => items.contains(b),
        _ => false,
    }
}

fn ordered(value: &AttributeValue, operand: &AttributeValue, accept: fn(Ordering) -> bool) -> bool {
    compare_attribute(value, operand).is_some_and(accept)
}

/// Evaluates a sort-key condition against the sort attribute of an item.
pub fn matches_sort(
    value: Option<&AttributeValue>,
    condition: &SortCondition<AttributeValue>,
) -> bool {
    let Some(value) = value else {
        return false;
    };
    match condition {
        SortCondition::Eq(v) => equals(value, v),
        SortCondition::Lt(v) => ordered(value, v, Ordering::is_lt),
        SortCondition::Le(v) => ordered(value, v, Ordering::is_le),
        SortCondition::Gt(v) => ordered(value, v, Ordering::is_gt),
        SortCondition::Ge(v) => ordered(value, v, Ordering::is_ge),
        SortCondition::Between(lo, hi) => {
            ordered(value, lo, Ordering::is_ge) && ordered(value, hi, Ordering::is_le)
        }
        SortCondition::BeginsWith(prefix) => begins_with(value, prefix),
    }
}

/// Evaluates a filter condition against an item.
pub fn matches_condition(item: &Item, condition: &Condition<AttributeValue>) -> bool {
    let value = item.get(&condition.attribute);
    match (&condition.comparison, value) {
        (Comparison::Exists, value) => value.is_some(),
        (Comparison::NotExists, value) => value.is_none(),
        (Comparison::Ne(v), None) => !matches!(v, AttributeValue::Null(_)),
        (_, None) => false,
        (Comparison::Eq(v), Some(value)) => equals(value, v),
        (Comparison::Ne(v), Some(value)) => !equals(value, v),
        (Comparison::Lt(v), Some(value)) => ordered(value, v, Ordering::is_lt),
        (Comparison::Le(v), Some(value)) => ordered(value, v, Ordering::is_le),
        (Comparison::Gt(v), Some(value)) => ordered(value, v, Ordering::is_gt),
        (Comparison::Ge(v), Some(value)) => ordered(value, v, Ordering::is_ge),
        (Comparison::Between(lo, hi), Some(value)) => {
            ordered(value, lo, Ordering::is_ge) && ordered(value, hi, Ordering::is_le)
        }
        (Comparison::BeginsWith(prefix), Some(value)) => begins_with(value, prefix),
        (Comparison::Contains(operand), Some(value)) => contains(value, operand),
    }
}

/// Returns true if the item satisfies every filter.
pub fn matches_all(item: &Item, filters: &[Condition<AttributeValue>]) -> bool {
    filters.iter().all(|condition| matches_condition(item, condition))
}
