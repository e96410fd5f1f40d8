//! Declarative filter translation for the managed platform.
//!
//! The platform exposes a filter API rather than SQL: predicates become
//! query pairs (`status=eq.approved`, `category_id=in.(1,2)`), ordering is
//! `order=column.direction`, and pagination is an inclusive `Range` header
//! computed from the half-open `[offset, offset + limit)` window.

use serde_json::Value as JsonValue;

use crate::error::DatastoreError;
use crate::filter::{Filter, OrderBy, Predicate, SortDirection};

/// Translate a filter into query pairs, one per predicate term.
///
/// # Errors
///
/// Returns `DatastoreError::Translation` for a range comparison against
/// null, mirroring the SQL path.
pub(crate) fn filter_pairs(filter: &Filter) -> Result<Vec<(String, String)>, DatastoreError> {
    let mut pairs = Vec::new();
    for (column, predicate) in filter.entries() {
        match predicate {
            Predicate::Eq(JsonValue::Null) => {
                pairs.push((column.clone(), "is.null".to_string()));
            }
            Predicate::Eq(value) => {
                pairs.push((column.clone(), format!("eq.{}", literal(value))));
            }
            Predicate::In(values) => {
                let rendered: Vec<String> = values.iter().map(literal).collect();
                pairs.push((column.clone(), format!("in.({})", rendered.join(","))));
            }
            Predicate::Cmp(cmps) => {
                for (op, value) in cmps {
                    if value.is_null() {
                        return Err(DatastoreError::Translation(format!(
                            "cannot apply '{}' to null on column '{column}'",
                            op.tag()
                        )));
                    }
                    pairs.push((column.clone(), format!("{}.{}", op.tag(), literal(value))));
                }
            }
        }
    }
    Ok(pairs)
}

/// `order=column.asc|desc` pair.
pub(crate) fn order_pair(order: &OrderBy) -> (String, String) {
    let dir = match order.direction {
        SortDirection::Asc => "asc",
        SortDirection::Desc => "desc",
    };
    ("order".to_string(), format!("{}.{dir}", order.column))
}

/// Inclusive range header value for a page window, if any pagination was
/// requested. A bare offset yields an open-ended range.
pub(crate) fn range_header(limit: Option<u64>, offset: Option<u64>) -> Option<String> {
    let from = offset.unwrap_or(0);
    match limit {
        Some(limit) => Some(format!("{from}-{}", from + limit.saturating_sub(1))),
        None if offset.is_some() => Some(format!("{from}-")),
        None => None,
    }
}

/// Render a scalar the way the filter API expects it.
///
/// Strings containing reserved characters are double-quoted so membership
/// lists stay unambiguous.
fn literal(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => {
            if s.contains([',', '(', ')', '"']) || s.chars().any(char::is_whitespace) {
                format!("\"{}\"", s.replace('"', "\\\""))
            } else {
                s.clone()
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::filter::{CmpOp, Filter};

    use super::*;

    #[test]
    fn predicates_translate_to_query_pairs() {
        let filter = Filter::new()
            .eq("status", "approved")
            .is_in("category_id", [1, 2])
            .cmp("base_price", CmpOp::Gte, 500)
            .eq("cancelled_at", JsonValue::Null);
        let pairs = filter_pairs(&filter).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("status".to_string(), "eq.approved".to_string()),
                ("category_id".to_string(), "in.(1,2)".to_string()),
                ("base_price".to_string(), "gte.500".to_string()),
                ("cancelled_at".to_string(), "is.null".to_string()),
            ]
        );
    }

    #[test]
    fn reserved_strings_are_quoted() {
        let filter = Filter::new().is_in("name", ["plain", "with, comma"]);
        let pairs = filter_pairs(&filter).unwrap();
        assert_eq!(pairs[0].1, "in.(plain,\"with, comma\")");
    }

    #[test]
    fn range_covers_the_same_window_as_offset_fetch() {
        assert_eq!(range_header(Some(10), Some(20)).as_deref(), Some("20-29"));
        assert_eq!(range_header(Some(1), None).as_deref(), Some("0-0"));
        assert_eq!(range_header(None, Some(5)).as_deref(), Some("5-"));
        assert_eq!(range_header(None, None), None);
    }

    #[test]
    fn order_pair_lowers_direction() {
        let order = crate::filter::OrderBy::parse("created_at desc").unwrap();
        assert_eq!(
            order_pair(&order),
            ("order".to_string(), "created_at.desc".to_string())
        );
    }
}
