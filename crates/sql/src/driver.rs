//! Driver traits wrapped by the facades
//!
//! A driver exposes one family of handle types: a pooled database, a single
//! connection, a transaction and a prepared statement. Every async method
//! takes the caller's [`CallContext`] unchanged.

use std::time::Duration;

use async_trait::async_trait;
use courier_core::{BoxError, CallContext};

use crate::types::{ExecResult, PoolStats, Row, Rows, TxOptions, Value};

/// Statement execution shared by databases, connections and transactions
#[async_trait]
pub trait Queryer: Send + Sync {
    async fn exec(
        &self,
        ctx: &CallContext,
        query: &str,
        args: &[Value],
    ) -> Result<ExecResult, BoxError>;

    async fn query(&self, ctx: &CallContext, query: &str, args: &[Value])
    -> Result<Rows, BoxError>;

    /// First row of the result, `None` when the query matched nothing
    async fn query_row(
        &self,
        ctx: &CallContext,
        query: &str,
        args: &[Value],
    ) -> Result<Option<Row>, BoxError>;
}

/// Prepared statement
#[async_trait]
pub trait StmtApi: Send + Sync + 'static {
    async fn exec(&self, ctx: &CallContext, args: &[Value]) -> Result<ExecResult, BoxError>;

    async fn query(&self, ctx: &CallContext, args: &[Value]) -> Result<Rows, BoxError>;

    async fn query_row(&self, ctx: &CallContext, args: &[Value])
    -> Result<Option<Row>, BoxError>;

    async fn close(&self, ctx: &CallContext) -> Result<(), BoxError>;
}

/// Open transaction
#[async_trait]
pub trait TxApi: Queryer + 'static {
    type Stmt: StmtApi;

    async fn prepare(&self, ctx: &CallContext, query: &str) -> Result<Self::Stmt, BoxError>;

    /// Transaction-specific handle for a statement prepared outside it
    async fn stmt(&self, ctx: &CallContext, stmt: &Self::Stmt) -> Self::Stmt;

    async fn commit(&self, ctx: &CallContext) -> Result<(), BoxError>;

    async fn rollback(&self, ctx: &CallContext) -> Result<(), BoxError>;
}

/// Single connection taken from the pool
#[async_trait]
pub trait ConnApi: Queryer + 'static {
    type Stmt: StmtApi;
    type Tx: TxApi<Stmt = Self::Stmt>;

    async fn begin_tx(&self, ctx: &CallContext, opts: &TxOptions) -> Result<Self::Tx, BoxError>;

    async fn prepare(&self, ctx: &CallContext, query: &str) -> Result<Self::Stmt, BoxError>;

    async fn ping(&self, ctx: &CallContext) -> Result<(), BoxError>;

    /// Return the connection to the pool
    async fn close(&self, ctx: &CallContext) -> Result<(), BoxError>;
}

/// Pooled database handle
#[async_trait]
pub trait DatabaseApi: Queryer + 'static {
    type Stmt: StmtApi;
    type Tx: TxApi<Stmt = Self::Stmt>;
    type Conn: ConnApi<Stmt = Self::Stmt, Tx = Self::Tx>;

    async fn begin_tx(&self, ctx: &CallContext, opts: &TxOptions) -> Result<Self::Tx, BoxError>;

    async fn conn(&self, ctx: &CallContext) -> Result<Self::Conn, BoxError>;

    async fn prepare(&self, ctx: &CallContext, query: &str) -> Result<Self::Stmt, BoxError>;

    async fn ping(&self, ctx: &CallContext) -> Result<(), BoxError>;

    async fn close(&self, ctx: &CallContext) -> Result<(), BoxError>;

    /// Name of the driver backing this database
    fn driver_name(&self) -> &str;

    fn stats(&self) -> PoolStats;

    /// `None` lets connections live forever
    fn set_conn_max_lifetime(&self, lifetime: Option<Duration>);

    fn set_max_idle_conns(&self, n: u32);

    /// Zero means unlimited
    fn set_max_open_conns(&self, n: u32);
}

/// Opens databases from a data source name
pub trait SqlDriver {
    type Database: DatabaseApi;

    /// # Errors
    ///
    /// Returns the driver's error when the DSN is rejected.
    fn open(&self, dsn: &str) -> Result<Self::Database, BoxError>;
}
