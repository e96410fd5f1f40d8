//! Typed filter and select-option shapes shared by every backend.
//!
//! Callers hand the layer dynamic JSON where-maps; those are validated here,
//! at the boundary, into a closed predicate tree before any backend-specific
//! translation runs. Unknown operator tags never travel further than this
//! module.

use serde_json::Value as JsonValue;

use crate::error::DatastoreError;

/// Comparison operators accepted inside an operator-map predicate.
///
/// The set is closed: `eq` is implicit (a bare scalar), a list is `in`, and
/// an object may carry only the four range operators below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gte,
    Lte,
    Gt,
    Lt,
}

impl CmpOp {
    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "gte" => Some(Self::Gte),
            "lte" => Some(Self::Lte),
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            _ => None,
        }
    }

    /// SQL comparison token.
    #[must_use]
    pub fn sql(self) -> &'static str {
        match self {
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }

    /// Declarative filter-API token.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Lt => "lt",
        }
    }
}

/// One conjunctive predicate on a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Scalar equality. `Eq(Null)` means `IS NULL`.
    Eq(JsonValue),
    /// Membership test. An empty list matches nothing.
    In(Vec<JsonValue>),
    /// One or more range comparisons, applied conjunctively.
    Cmp(Vec<(CmpOp, JsonValue)>),
}

/// A conjunctive filter over one table: every entry must hold.
///
/// An empty filter means "no filter": it matches every row, never none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    entries: Vec<(String, Predicate)>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(String, Predicate)] {
        &self.entries
    }

    /// Add an equality predicate.
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.entries.push((column.into(), Predicate::Eq(value.into())));
        self
    }

    /// Add a membership predicate.
    #[must_use]
    pub fn is_in(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<JsonValue>>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.entries.push((column.into(), Predicate::In(values)));
        self
    }

    /// Add a range comparison predicate.
    #[must_use]
    pub fn cmp(mut self, column: impl Into<String>, op: CmpOp, value: impl Into<JsonValue>) -> Self {
        self.entries
            .push((column.into(), Predicate::Cmp(vec![(op, value.into())])));
        self
    }

    #[must_use]
    pub fn gte(self, column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.cmp(column, CmpOp::Gte, value)
    }

    #[must_use]
    pub fn lte(self, column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.cmp(column, CmpOp::Lte, value)
    }

    /// Validate a dynamic where-map into a typed filter.
    ///
    /// Translation rules: scalar → equality, list → membership, object → one
    /// range operator per key. Column names must be plain identifiers.
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Translation` for an unknown operator tag, a
    /// non-scalar comparison operand, or a malformed column name.
    pub fn from_where_map(map: &serde_json::Map<String, JsonValue>) -> Result<Self, DatastoreError> {
        let mut filter = Self::new();
        for (column, value) in map {
            ensure_ident(column)?;
            let predicate = match value {
                JsonValue::Array(items) => Predicate::In(items.clone()),
                JsonValue::Object(ops) => {
                    let mut cmps = Vec::with_capacity(ops.len());
                    for (tag, operand) in ops {
                        let op = CmpOp::from_tag(tag).ok_or_else(|| {
                            DatastoreError::Translation(format!(
                                "unknown filter operator '{tag}' on column '{column}'"
                            ))
                        })?;
                        if !is_scalar(operand) {
                            return Err(DatastoreError::Translation(format!(
                                "operator '{tag}' on column '{column}' requires a scalar operand"
                            )));
                        }
                        cmps.push((op, operand.clone()));
                    }
                    Predicate::Cmp(cmps)
                }
                scalar => Predicate::Eq(scalar.clone()),
            };
            filter.entries.push((column.clone(), predicate));
        }
        Ok(filter)
    }
}

fn is_scalar(value: &JsonValue) -> bool {
    !matches!(value, JsonValue::Array(_) | JsonValue::Object(_))
}

/// Sort direction for an ordered select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A parsed `"column direction"` order clause. The direction is optional
/// and defaults to ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderBy {
    /// Split a raw order string on its single space.
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Translation` for a malformed column name or
    /// an unrecognized direction token.
    pub fn parse(raw: &str) -> Result<Self, DatastoreError> {
        let mut parts = raw.split_whitespace();
        let column = parts.next().ok_or_else(|| {
            DatastoreError::Translation("empty order_by clause".to_string())
        })?;
        ensure_ident(column)?;
        let direction = match parts.next() {
            None => SortDirection::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            Some(dir) => {
                return Err(DatastoreError::Translation(format!(
                    "unknown sort direction '{dir}'"
                )));
            }
        };
        if parts.next().is_some() {
            return Err(DatastoreError::Translation(format!(
                "order_by must be 'column [asc|desc]', got '{raw}'"
            )));
        }
        Ok(Self {
            column: column.to_string(),
            direction,
        })
    }
}

/// Options for a select call.
///
/// `columns` defaults to `"*"`. The platform backend forwards the projection
/// verbatim (embedded-resource syntax included); the relational backend
/// accepts only `*` or a comma-separated identifier list.
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    pub columns: Option<String>,
    pub filter: Filter,
    pub order_by: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub(crate) fn order(&self) -> Result<Option<OrderBy>, DatastoreError> {
        self.order_by.as_deref().map(OrderBy::parse).transpose()
    }
}

/// Reject anything that is not a bare SQL/REST identifier.
///
/// # Errors
///
/// Returns `DatastoreError::Translation` when the name is empty, starts
/// with a digit, or contains characters outside `[A-Za-z0-9_]`.
pub(crate) fn ensure_ident(name: &str) -> Result<(), DatastoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DatastoreError::Translation(format!(
            "'{name}' is not a valid identifier"
        )))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn where_map_shapes_translate() {
        let map = json!({
            "status": "approved",
            "category_id": [1, 2, 3],
            "base_price": {"gte": 500, "lte": 2000}
        });
        let filter = Filter::from_where_map(map.as_object().unwrap()).unwrap();
        assert_eq!(filter.entries().len(), 3);
        assert_eq!(
            filter.entries()[2].1,
            Predicate::Cmp(vec![(CmpOp::Gte, json!(500)), (CmpOp::Lte, json!(2000))])
        );
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let map = json!({"age": {"like": "x"}});
        let err = Filter::from_where_map(map.as_object().unwrap()).unwrap_err();
        assert!(err.is_translation(), "got {err}");
    }

    #[test]
    fn order_by_defaults_ascending() {
        let order = OrderBy::parse("created_at").unwrap();
        assert_eq!(order.direction, SortDirection::Asc);
        let order = OrderBy::parse("base_price DESC").unwrap();
        assert_eq!(order.direction, SortDirection::Desc);
        assert!(OrderBy::parse("price; drop").is_err());
    }
}
