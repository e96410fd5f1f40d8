//! Async data-access middleware for the Atlas travel marketplace.
//!
//! One operation contract (typed CRUD, raw queries, transactions, and file
//! storage) over either of two structurally different backends: a managed
//! data platform with a declarative REST filter API, or SQL Server through
//! pooled parameterized connections. The backend is selected once at
//! process start; nothing above the adapters branches on it.
//!
//! ```no_run
//! use atlas_datastore::prelude::*;
//!
//! # async fn demo() -> Result<(), DatastoreError> {
//! let config = DatabaseConfig::from_env()?;
//! let service = BackendService::initialize(config).await?;
//! let data = DomainData::new(service);
//!
//! let stays = data
//!     .list_services(&ServiceQuery::new().status(ListingStatus::Approved).page(10, 0))
//!     .await?;
//! # let _ = stays;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod domain;
pub mod error;
pub mod filter;
pub mod platform;
pub mod relational;
pub mod service;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transaction;
pub mod types;

pub use backend::{BackendStatus, DataBackend};
pub use config::{DatabaseConfig, PlatformOptions, RelationalOptions};
pub use error::DatastoreError;
pub use filter::{CmpOp, Filter, OrderBy, SelectOptions, SortDirection};
pub use service::BackendService;
pub use transaction::TransactionContext;
pub use types::{BackendKind, RecordId, Row, from_row, to_row};

/// The one-stop import for consumers.
pub mod prelude {
    pub use crate::backend::{BackendStatus, DataBackend};
    pub use crate::config::{DatabaseConfig, PlatformOptions, RelationalOptions};
    pub use crate::domain::{
        Booking, BookingStatus, Category, DomainData, Event, ListingStatus, Location, NewBooking,
        NewEvent, NewService, NewUser, PaymentStatus, Service, ServiceKind, ServiceQuery, User,
    };
    pub use crate::error::DatastoreError;
    pub use crate::filter::{CmpOp, Filter, SelectOptions};
    pub use crate::service::BackendService;
    pub use crate::transaction::TransactionContext;
    pub use crate::types::{BackendKind, RecordId, Row, from_row, to_row};
}
