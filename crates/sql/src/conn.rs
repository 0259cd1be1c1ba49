use courier_core::{CallContext, Result};

use crate::driver::ConnApi;
use crate::scope::{ConnInfo, Scope};
use crate::stmt::Stmt;
use crate::tx::Tx;
use crate::types::{ExecResult, Row, Rows, TxOptions, Value};

/// Traced single connection
#[derive(Debug)]
pub struct Conn<C: ConnApi> {
    scope: Scope,
    conn: C,
}

impl<C: ConnApi> Conn<C> {
    pub(crate) const fn new(scope: Scope, conn: C) -> Self {
        Self { scope, conn }
    }

    pub const fn conn_info(&self) -> &ConnInfo {
        self.scope.info()
    }

    /// Driver connection, for calls that should not be traced
    pub const fn inner(&self) -> &C {
        &self.conn
    }

    pub async fn begin_tx(&self, ctx: &CallContext, opts: &TxOptions) -> Result<Tx<C::Tx>> {
        let tx = self
            .scope
            .start(ctx, "conn.BeginTx", "")
            .run(self.conn.begin_tx(ctx, opts))
            .await?;
        Ok(Tx::new(self.scope.clone(), tx))
    }

    /// Return the connection to the pool
    pub async fn close(self, ctx: &CallContext) -> Result<()> {
        self.scope
            .start(ctx, "conn.Close", "")
            .run(self.conn.close(ctx))
            .await
    }

    pub async fn exec(&self, ctx: &CallContext, query: &str, args: &[Value]) -> Result<ExecResult> {
        self.scope
            .start(ctx, "conn.Exec", query)
            .run(self.conn.exec(ctx, query, args))
            .await
    }

    pub async fn ping(&self, ctx: &CallContext) -> Result<()> {
        self.scope
            .start(ctx, "conn.Ping", "")
            .run(self.conn.ping(ctx))
            .await
    }

    pub async fn prepare(&self, ctx: &CallContext, query: &str) -> Result<Stmt<C::Stmt>> {
        let stmt = self
            .scope
            .start(ctx, "conn.Prepare", query)
            .run(self.conn.prepare(ctx, query))
            .await?;
        Ok(Stmt::new(self.scope.clone(), query.to_string(), stmt))
    }

    pub async fn query(&self, ctx: &CallContext, query: &str, args: &[Value]) -> Result<Rows> {
        self.scope
            .start(ctx, "conn.Query", query)
            .run(self.conn.query(ctx, query, args))
            .await
    }

    pub async fn query_row(
        &self,
        ctx: &CallContext,
        query: &str,
        args: &[Value],
    ) -> Result<Option<Row>> {
        self.scope
            .start(ctx, "conn.QueryRow", query)
            .run(self.conn.query_row(ctx, query, args))
            .await
    }
}
