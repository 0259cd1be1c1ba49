//! Traced database handle

use std::time::Duration;

use courier_core::{CallContext, Error, Result, Telemetry};
use tracing::debug;

use crate::config::PoolConfig;
use crate::conn::Conn;
use crate::driver::{DatabaseApi, SqlDriver};
use crate::dsn::parse_dsn;
use crate::scope::{ConnInfo, Scope};
use crate::stmt::Stmt;
use crate::tx::Tx;
use crate::types::{ExecResult, PoolStats, Row, Rows, TxOptions, Value};

/// Traced and metered pooled database.
///
/// Every method opens a client span tagged with the database instance, user
/// and statement, and observes `client_sql_cmd_duration_seconds{op, success}`
/// with the operation name (`db.Exec`, `conn.Query`, ...) as `op`.
/// Connections, transactions and statements derived from it keep its
/// identity.
#[derive(Debug)]
pub struct Db<D: DatabaseApi> {
    scope: Scope,
    db: D,
}

impl<D: DatabaseApi> Db<D> {
    /// Open a database through `driver`, taking instance and user from the DSN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Call`] when the driver rejects the DSN.
    pub fn open<Drv>(driver: &Drv, dsn: &str, telemetry: &Telemetry) -> Result<Self>
    where
        Drv: SqlDriver<Database = D>,
    {
        let db = driver
            .open(dsn)
            .map_err(|source| Error::call("sql.Open", "failed to open database", source))?;
        let info = parse_dsn(dsn)
            .map(|dsn| ConnInfo::new(dsn.db_name, dsn.user))
            .unwrap_or_default();
        debug!(instance = %info.instance, user = %info.user, "Database opened");
        Self::with_conn_info(db, info, telemetry)
    }

    /// Wrap an already opened database; spans carry no instance or user
    ///
    /// # Errors
    ///
    /// Fails if the command series conflicts with one already registered.
    pub fn from_database(db: D, telemetry: &Telemetry) -> Result<Self> {
        Self::with_conn_info(db, ConnInfo::default(), telemetry)
    }

    /// Wrap an already opened database with a known identity
    ///
    /// # Errors
    ///
    /// Fails if the command series conflicts with one already registered.
    pub fn with_conn_info(db: D, info: ConnInfo, telemetry: &Telemetry) -> Result<Self> {
        Ok(Self {
            scope: Scope::new(info, telemetry)?,
            db,
        })
    }

    pub const fn conn_info(&self) -> &ConnInfo {
        self.scope.info()
    }

    /// Driver database, for calls that should not be traced
    pub const fn inner(&self) -> &D {
        &self.db
    }

    pub async fn begin_tx(&self, ctx: &CallContext, opts: &TxOptions) -> Result<Tx<D::Tx>> {
        let tx = self
            .scope
            .start(ctx, "db.BeginTx", "")
            .run(self.db.begin_tx(ctx, opts))
            .await?;
        Ok(Tx::new(self.scope.clone(), tx))
    }

    pub async fn close(self, ctx: &CallContext) -> Result<()> {
        self.scope
            .start(ctx, "db.Close", "")
            .run(self.db.close(ctx))
            .await
    }

    /// Take a single connection from the pool
    pub async fn conn(&self, ctx: &CallContext) -> Result<Conn<D::Conn>> {
        let conn = self
            .scope
            .start(ctx, "db.Conn", "")
            .run(self.db.conn(ctx))
            .await?;
        Ok(Conn::new(self.scope.clone(), conn))
    }

    /// Name of the underlying driver
    pub async fn driver(&self, ctx: &CallContext) -> String {
        self.scope
            .start(ctx, "db.Driver", "")
            .run_infallible(async { self.db.driver_name().to_string() })
            .await
    }

    pub async fn exec(&self, ctx: &CallContext, query: &str, args: &[Value]) -> Result<ExecResult> {
        self.scope
            .start(ctx, "db.Exec", query)
            .run(self.db.exec(ctx, query, args))
            .await
    }

    pub async fn ping(&self, ctx: &CallContext) -> Result<()> {
        self.scope
            .start(ctx, "db.Ping", "")
            .run(self.db.ping(ctx))
            .await
    }

    pub async fn prepare(&self, ctx: &CallContext, query: &str) -> Result<Stmt<D::Stmt>> {
        let stmt = self
            .scope
            .start(ctx, "db.Prepare", query)
            .run(self.db.prepare(ctx, query))
            .await?;
        Ok(Stmt::new(self.scope.clone(), query.to_string(), stmt))
    }

    pub async fn query(&self, ctx: &CallContext, query: &str, args: &[Value]) -> Result<Rows> {
        self.scope
            .start(ctx, "db.Query", query)
            .run(self.db.query(ctx, query, args))
            .await
    }

    pub async fn query_row(
        &self,
        ctx: &CallContext,
        query: &str,
        args: &[Value],
    ) -> Result<Option<Row>> {
        self.scope
            .start(ctx, "db.QueryRow", query)
            .run(self.db.query_row(ctx, query, args))
            .await
    }

    pub async fn stats(&self, ctx: &CallContext) -> PoolStats {
        self.scope
            .start(ctx, "db.Stats", "")
            .run_infallible(async { self.db.stats() })
            .await
    }

    /// `None` lets connections live forever
    pub fn set_conn_max_lifetime(&self, lifetime: Option<Duration>) {
        self.db.set_conn_max_lifetime(lifetime);
    }

    pub fn set_max_idle_conns(&self, n: u32) {
        self.db.set_max_idle_conns(n);
    }

    /// Zero means unlimited
    pub fn set_max_open_conns(&self, n: u32) {
        self.db.set_max_open_conns(n);
    }

    /// Apply every knob set in `config`
    pub fn configure_pool(&self, config: &PoolConfig) {
        if let Some(n) = config.max_open_conns {
            self.set_max_open_conns(n);
        }
        if let Some(n) = config.max_idle_conns {
            self.set_max_idle_conns(n);
        }
        if let Some(lifetime) = config.conn_max_lifetime() {
            self.set_conn_max_lifetime(lifetime);
        }
    }
}
