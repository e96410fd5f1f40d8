// Managed-platform backend: declarative REST filter API plus native object
// storage, one authenticated HTTP request per operation.
//
// - query: filter tree to query pairs and range headers
// - executor: response decoding and status-to-taxonomy mapping
// - adapter: the DataBackend implementation
// - storage: bucket object endpoints

pub mod adapter;
pub(crate) mod executor;
pub(crate) mod query;
mod storage;

pub use adapter::PlatformAdapter;
