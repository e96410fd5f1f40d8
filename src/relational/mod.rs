// Relational backend: SQL Server over pooled tiberius connections.
//
// - pool: deadpool manager and pool construction
// - sql: statement assembly with @PN placeholders
// - params: JSON value binding
// - rows: result stream to JSON rows
// - executor: statement execution against one client
// - adapter: the DataBackend implementation
// - transaction: the pinned-connection transaction

pub mod adapter;
pub(crate) mod executor;
pub(crate) mod params;
pub mod pool;
pub(crate) mod rows;
pub(crate) mod sql;
pub(crate) mod transaction;

pub use adapter::RelationalAdapter;
pub use pool::{ConnectionManager, SqlClient, SqlPool};
