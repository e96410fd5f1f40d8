//! SQL text assembly for the relational backend.
//!
//! Statements use `@P1, @P2, …` placeholders numbered in the same order the
//! values are pushed onto the parameter list; every value is bound through
//! the driver's parameter API, never interpolated into the text.
//! Identifiers are validated and bracket-quoted.

use serde_json::Value as JsonValue;

use crate::error::DatastoreError;
use crate::filter::{Filter, Predicate, SelectOptions, SortDirection, ensure_ident};
use crate::types::Row;

/// A statement and its positional parameters, ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BuiltQuery {
    pub sql: String,
    pub params: Vec<JsonValue>,
}

/// `SELECT … FROM [table] WHERE … ORDER BY … OFFSET … FETCH …`
///
/// `OFFSET…FETCH` requires an ORDER BY in T-SQL; when the caller paginates
/// without ordering, `ORDER BY (SELECT NULL)` keeps the page window valid.
pub(crate) fn build_select(
    table: &str,
    options: &SelectOptions,
) -> Result<BuiltQuery, DatastoreError> {
    ensure_ident(table)?;
    let mut params = Vec::new();
    let mut sql = format!(
        "SELECT {} FROM [{table}]",
        projection(options.columns.as_deref())?
    );
    if let Some(clause) = where_clause(&options.filter, &mut params)? {
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
    let order = options.order()?;
    match &order {
        Some(order) => {
            let dir = match order.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            sql.push_str(&format!(" ORDER BY [{}] {dir}", order.column));
        }
        None if options.limit.is_some() || options.offset.is_some() => {
            sql.push_str(" ORDER BY (SELECT NULL)");
        }
        None => {}
    }
    if options.limit.is_some() || options.offset.is_some() {
        sql.push_str(&format!(" OFFSET {} ROWS", options.offset.unwrap_or(0)));
        if let Some(limit) = options.limit {
            sql.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
        }
    }
    Ok(BuiltQuery { sql, params })
}

/// `INSERT INTO [table] (…) OUTPUT INSERTED.* VALUES (…)`; one round trip
/// writes the row and returns it with server-assigned fields.
pub(crate) fn build_insert(table: &str, data: &Row) -> Result<BuiltQuery, DatastoreError> {
    ensure_ident(table)?;
    if data.is_empty() {
        return Ok(BuiltQuery {
            sql: format!("INSERT INTO [{table}] OUTPUT INSERTED.* DEFAULT VALUES"),
            params: Vec::new(),
        });
    }
    let mut columns = Vec::with_capacity(data.len());
    let mut placeholders = Vec::with_capacity(data.len());
    let mut params = Vec::with_capacity(data.len());
    for (column, value) in data {
        ensure_ident(column)?;
        columns.push(format!("[{column}]"));
        placeholders.push(push_param(&mut params, value.clone()));
    }
    Ok(BuiltQuery {
        sql: format!(
            "INSERT INTO [{table}] ({}) OUTPUT INSERTED.* VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        ),
        params,
    })
}

/// `UPDATE [table] SET … OUTPUT INSERTED.* WHERE …`
pub(crate) fn build_update(
    table: &str,
    data: &Row,
    filter: &Filter,
) -> Result<BuiltQuery, DatastoreError> {
    ensure_ident(table)?;
    if data.is_empty() {
        return Err(DatastoreError::Translation(
            "update requires at least one column".to_string(),
        ));
    }
    let mut params = Vec::new();
    let mut assignments = Vec::with_capacity(data.len());
    for (column, value) in data {
        ensure_ident(column)?;
        let placeholder = push_param(&mut params, value.clone());
        assignments.push(format!("[{column}] = {placeholder}"));
    }
    let mut sql = format!(
        "UPDATE [{table}] SET {} OUTPUT INSERTED.*",
        assignments.join(", ")
    );
    if let Some(clause) = where_clause(filter, &mut params)? {
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
    Ok(BuiltQuery { sql, params })
}

/// `DELETE FROM [table] OUTPUT DELETED.* WHERE …`
///
/// An empty filter produces an unfiltered delete that removes every row;
/// the contract preserves that behavior rather than guessing a guard.
pub(crate) fn build_delete(table: &str, filter: &Filter) -> Result<BuiltQuery, DatastoreError> {
    ensure_ident(table)?;
    let mut params = Vec::new();
    let mut sql = format!("DELETE FROM [{table}] OUTPUT DELETED.*");
    if let Some(clause) = where_clause(filter, &mut params)? {
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
    Ok(BuiltQuery { sql, params })
}

fn projection(columns: Option<&str>) -> Result<String, DatastoreError> {
    let Some(columns) = columns else {
        return Ok("*".to_string());
    };
    let trimmed = columns.trim();
    if trimmed == "*" {
        return Ok("*".to_string());
    }
    let mut quoted = Vec::new();
    for column in trimmed.split(',') {
        let column = column.trim();
        ensure_ident(column)?;
        quoted.push(format!("[{column}]"));
    }
    Ok(quoted.join(", "))
}

fn where_clause(
    filter: &Filter,
    params: &mut Vec<JsonValue>,
) -> Result<Option<String>, DatastoreError> {
    if filter.is_empty() {
        return Ok(None);
    }
    let mut terms = Vec::with_capacity(filter.entries().len());
    for (column, predicate) in filter.entries() {
        ensure_ident(column)?;
        match predicate {
            Predicate::Eq(JsonValue::Null) => terms.push(format!("[{column}] IS NULL")),
            Predicate::Eq(value) => {
                let placeholder = push_param(params, value.clone());
                terms.push(format!("[{column}] = {placeholder}"));
            }
            Predicate::In(values) if values.is_empty() => {
                // Membership in the empty set matches nothing.
                terms.push("1 = 0".to_string());
            }
            Predicate::In(values) => {
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| push_param(params, v.clone()))
                    .collect();
                terms.push(format!("[{column}] IN ({})", placeholders.join(", ")));
            }
            Predicate::Cmp(cmps) => {
                for (op, value) in cmps {
                    if value.is_null() {
                        return Err(DatastoreError::Translation(format!(
                            "cannot apply '{}' to null on column '{column}'",
                            op.tag()
                        )));
                    }
                    let placeholder = push_param(params, value.clone());
                    terms.push(format!("[{column}] {} {placeholder}", op.sql()));
                }
            }
        }
    }
    Ok(Some(terms.join(" AND ")))
}

fn push_param(params: &mut Vec<JsonValue>, value: JsonValue) -> String {
    params.push(value);
    format!("@P{}", params.len())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::filter::{CmpOp, Filter};

    use super::*;

    #[test]
    fn select_translates_filter_order_and_page() {
        let options = SelectOptions::new()
            .filter(
                Filter::new()
                    .eq("status", "approved")
                    .is_in("category_id", [1, 2])
                    .cmp("base_price", CmpOp::Gte, 500),
            )
            .order_by("base_price desc")
            .limit(10)
            .offset(20);
        let built = build_select("services", &options).unwrap();
        assert_eq!(
            built.sql,
            "SELECT * FROM [services] WHERE [status] = @P1 AND [category_id] IN (@P2, @P3) \
             AND [base_price] >= @P4 ORDER BY [base_price] DESC \
             OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(built.params, vec![json!("approved"), json!(1), json!(2), json!(500)]);
    }

    #[test]
    fn pagination_without_order_injects_null_order() {
        let options = SelectOptions::new().limit(5);
        let built = build_select("users", &options).unwrap();
        assert_eq!(
            built.sql,
            "SELECT * FROM [users] ORDER BY (SELECT NULL) OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY"
        );
    }

    #[test]
    fn null_equality_becomes_is_null() {
        let options =
            SelectOptions::new().filter(Filter::new().eq("cancelled_at", JsonValue::Null));
        let built = build_select("bookings", &options).unwrap();
        assert_eq!(
            built.sql,
            "SELECT * FROM [bookings] WHERE [cancelled_at] IS NULL"
        );
        assert!(built.params.is_empty());
    }

    #[test]
    fn empty_membership_matches_nothing() {
        let filter = Filter::new().is_in("id", Vec::<i64>::new());
        let built = build_delete("bookings", &filter).unwrap();
        assert_eq!(built.sql, "DELETE FROM [bookings] OUTPUT DELETED.* WHERE 1 = 0");
    }

    #[test]
    fn insert_uses_output_clause_in_column_order() {
        let mut row = Row::new();
        row.insert("base_price".to_string(), json!(1500));
        row.insert("name".to_string(), json!("Test Stay"));
        let built = build_insert("services", &row).unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO [services] ([base_price], [name]) OUTPUT INSERTED.* VALUES (@P1, @P2)"
        );
        assert_eq!(built.params, vec![json!(1500), json!("Test Stay")]);
    }

    #[test]
    fn update_binds_set_before_where() {
        let mut patch = Row::new();
        patch.insert("status".to_string(), json!("confirmed"));
        let filter = Filter::new().eq("id", 7);
        let built = build_update("bookings", &patch, &filter).unwrap();
        assert_eq!(
            built.sql,
            "UPDATE [bookings] SET [status] = @P1 OUTPUT INSERTED.* WHERE [id] = @P2"
        );
        assert_eq!(built.params, vec![json!("confirmed"), json!(7)]);
    }

    #[test]
    fn delete_without_filter_is_unfiltered() {
        let built = build_delete("sessions", &Filter::new()).unwrap();
        assert_eq!(built.sql, "DELETE FROM [sessions] OUTPUT DELETED.*");
    }

    #[test]
    fn hostile_identifiers_are_rejected() {
        assert!(build_select("services; drop table x", &SelectOptions::new()).is_err());
        let options = SelectOptions::new().columns("name, 1=1--");
        assert!(build_select("services", &options).is_err());
    }
}
