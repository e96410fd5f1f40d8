//! In-memory backend for contract and domain tests.
//!
//! Implements the full operation contract over process memory, including
//! the filter semantics both real adapters translate, so domain logic and
//! the facade can be exercised without a live backend. A failure switch
//! simulates an unreachable host: every operation then resolves to a
//! `Connection` error value instead of panicking.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::backend::DataBackend;
use crate::error::DatastoreError;
use crate::filter::{CmpOp, Filter, Predicate, SelectOptions, SortDirection};
use crate::types::{BackendKind, Row};

#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    /// Arm or disarm the simulated connection failure.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Preload fixture rows.
    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        self.lock_tables()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    fn lock_tables(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Row>>> {
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_files(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        match self.files.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn guard(&self) -> Result<(), DatastoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DatastoreError::Connection(
                "simulated unreachable backend".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn matches(row: &Row, filter: &Filter) -> bool {
        filter.entries().iter().all(|(column, predicate)| {
            let value = row.get(column).unwrap_or(&JsonValue::Null);
            match predicate {
                Predicate::Eq(expected) => json_eq(value, expected),
                Predicate::In(values) => values.iter().any(|v| json_eq(value, v)),
                Predicate::Cmp(cmps) => {
                    cmps.iter()
                        .all(|(op, operand)| match compare_json(value, operand) {
                            Some(ordering) => match op {
                                CmpOp::Gte => ordering != CmpOrdering::Less,
                                CmpOp::Lte => ordering != CmpOrdering::Greater,
                                CmpOp::Gt => ordering == CmpOrdering::Greater,
                                CmpOp::Lt => ordering == CmpOrdering::Less,
                            },
                            None => false,
                        })
                }
            }
        })
    }
}

fn json_eq(a: &JsonValue, b: &JsonValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare_json(a: &JsonValue, b: &JsonValue) -> Option<CmpOrdering> {
    match (a, b) {
        (JsonValue::String(x), JsonValue::String(y)) => Some(x.cmp(y)),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => Some(x.cmp(y)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    }
}

#[async_trait]
impl DataBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn supports_atomic_transactions(&self) -> bool {
        false
    }

    async fn connect(&self) -> Result<(), DatastoreError> {
        self.guard()
    }

    async fn select_rows(
        &self,
        table: &str,
        options: &SelectOptions,
    ) -> Result<Vec<Row>, DatastoreError> {
        self.guard()?;
        let order = options.order()?;
        let tables = self.lock_tables();
        let mut rows: Vec<Row> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| Self::matches(row, &options.filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let left = a.get(&order.column).unwrap_or(&JsonValue::Null);
                let right = b.get(&order.column).unwrap_or(&JsonValue::Null);
                let ordering = compare_json(left, right).unwrap_or(CmpOrdering::Equal);
                match order.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let offset = usize::try_from(options.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let rows: Vec<Row> = match options.limit {
            Some(limit) => rows
                .into_iter()
                .skip(offset)
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            None => rows.into_iter().skip(offset).collect(),
        };

        match options.columns.as_deref() {
            None | Some("*") => Ok(rows),
            Some(projection) => {
                let keep: Vec<&str> = projection.split(',').map(str::trim).collect();
                Ok(rows
                    .into_iter()
                    .map(|row| {
                        row.into_iter()
                            .filter(|(key, _)| keep.contains(&key.as_str()))
                            .collect()
                    })
                    .collect())
            }
        }
    }

    async fn insert_row(&self, table: &str, data: Row) -> Result<Row, DatastoreError> {
        self.guard()?;
        let mut row = data;
        if !row.contains_key("id") {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            row.insert("id".to_string(), JsonValue::from(id));
        }
        self.lock_tables()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update_rows(
        &self,
        table: &str,
        data: Row,
        filter: &Filter,
    ) -> Result<Vec<Row>, DatastoreError> {
        self.guard()?;
        let mut tables = self.lock_tables();
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut() {
                if Self::matches(row, filter) {
                    for (key, value) in &data {
                        row.insert(key.clone(), value.clone());
                    }
                    updated.push(row.clone());
                }
            }
        }
        Ok(updated)
    }

    async fn delete_rows(&self, table: &str, filter: &Filter) -> Result<u64, DatastoreError> {
        self.guard()?;
        let mut tables = self.lock_tables();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !Self::matches(row, filter));
        Ok((before - rows.len()) as u64)
    }

    async fn raw_query(
        &self,
        statement: &str,
        _params: &[JsonValue],
    ) -> Result<Vec<Row>, DatastoreError> {
        self.guard()?;
        Err(DatastoreError::Backend(format!(
            "memory backend cannot run '{statement}'"
        )))
    }

    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DatastoreError> {
        self.guard()?;
        self.lock_files().insert(format!("{bucket}/{path}"), bytes);
        Ok(self.file_url(bucket, path))
    }

    async fn delete_file(&self, bucket: &str, path: &str) -> Result<(), DatastoreError> {
        self.guard()?;
        self.lock_files().remove(&format!("{bucket}/{path}"));
        Ok(())
    }

    fn file_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{bucket}/{path}")
    }
}
