use deadpool::managed::{Manager, Metrics, Pool, RecycleError, RecycleResult};
use tiberius::{AuthMethod, Client, Config as TiberiusConfig, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::config::RelationalOptions;
use crate::error::DatastoreError;

/// Type alias for a connected SQL Server client.
pub type SqlClient = Client<Compat<TcpStream>>;

/// Deadpool manager for SQL Server connections.
#[derive(Clone)]
pub struct ConnectionManager {
    config: TiberiusConfig,
    host: String,
    port: u16,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl Manager for ConnectionManager {
    type Type = SqlClient;
    type Error = tiberius::error::Error;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        let addr = format!("{}:{}", self.host, self.port);
        let tcp = TcpStream::connect(addr)
            .await
            .map_err(|e| tiberius::error::Error::Io {
                kind: e.kind(),
                message: format!("TCP connection error: {e}"),
            })?;
        let tcp = tcp.compat_write();
        Client::connect(self.config.clone(), tcp).await
    }

    async fn recycle(
        &self,
        client: &mut Self::Type,
        _metrics: &Metrics,
    ) -> RecycleResult<Self::Error> {
        // Probe the connection before handing it back out.
        match tiberius::Query::new("SELECT 1").query(client).await {
            Ok(_) => Ok(()),
            Err(e) => Err(RecycleError::Backend(e)),
        }
    }
}

/// Connection pool shared by all non-transactional calls.
pub type SqlPool = Pool<ConnectionManager>;

/// Build the pool from relational options. Pool construction is lazy; no
/// connection is opened until the first checkout.
///
/// # Errors
///
/// Returns `DatastoreError::Connection` if the pool cannot be configured.
pub(crate) fn build_pool(opts: &RelationalOptions) -> Result<SqlPool, DatastoreError> {
    let mut config = TiberiusConfig::new();
    config.host(&opts.host);
    config.database(&opts.database);
    config.port(opts.port);
    config.authentication(AuthMethod::sql_server(&opts.user, &opts.password));
    if opts.encrypt {
        config.encryption(EncryptionLevel::Required);
    } else {
        config.encryption(EncryptionLevel::NotSupported);
    }
    if opts.trust_cert {
        config.trust_cert();
    }

    let manager = ConnectionManager {
        config,
        host: opts.host.clone(),
        port: opts.port,
    };

    Pool::builder(manager)
        .max_size(opts.max_pool_size)
        .build()
        .map_err(|e| {
            DatastoreError::Connection(format!("failed to create SQL Server pool: {e}"))
        })
}
