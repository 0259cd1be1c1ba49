use courier_core::{CallContext, Result};

use crate::driver::TxApi;
use crate::scope::{ConnInfo, Scope};
use crate::stmt::Stmt;
use crate::types::{ExecResult, Row, Rows, Value};

/// Traced transaction.
///
/// `commit` and `rollback` consume the handle, so a transaction ends at most
/// once through this facade.
#[derive(Debug)]
pub struct Tx<T: TxApi> {
    scope: Scope,
    tx: T,
}

impl<T: TxApi> Tx<T> {
    pub(crate) const fn new(scope: Scope, tx: T) -> Self {
        Self { scope, tx }
    }

    pub const fn conn_info(&self) -> &ConnInfo {
        self.scope.info()
    }

    /// Driver transaction, for calls that should not be traced
    pub const fn inner(&self) -> &T {
        &self.tx
    }

    pub async fn commit(self, ctx: &CallContext) -> Result<()> {
        self.scope
            .start(ctx, "tx.Commit", "")
            .run(self.tx.commit(ctx))
            .await
    }

    pub async fn rollback(self, ctx: &CallContext) -> Result<()> {
        self.scope
            .start(ctx, "tx.Rollback", "")
            .run(self.tx.rollback(ctx))
            .await
    }

    pub async fn exec(&self, ctx: &CallContext, query: &str, args: &[Value]) -> Result<ExecResult> {
        self.scope
            .start(ctx, "tx.Exec", query)
            .run(self.tx.exec(ctx, query, args))
            .await
    }

    pub async fn prepare(&self, ctx: &CallContext, query: &str) -> Result<Stmt<T::Stmt>> {
        let stmt = self
            .scope
            .start(ctx, "tx.Prepare", query)
            .run(self.tx.prepare(ctx, query))
            .await?;
        Ok(Stmt::new(self.scope.clone(), query.to_string(), stmt))
    }

    pub async fn query(&self, ctx: &CallContext, query: &str, args: &[Value]) -> Result<Rows> {
        self.scope
            .start(ctx, "tx.Query", query)
            .run(self.tx.query(ctx, query, args))
            .await
    }

    pub async fn query_row(
        &self,
        ctx: &CallContext,
        query: &str,
        args: &[Value],
    ) -> Result<Option<Row>> {
        self.scope
            .start(ctx, "tx.QueryRow", query)
            .run(self.tx.query_row(ctx, query, args))
            .await
    }

    /// Transaction-specific copy of a statement prepared elsewhere
    pub async fn stmt(&self, ctx: &CallContext, stmt: &Stmt<T::Stmt>) -> Stmt<T::Stmt> {
        let inner = self
            .scope
            .start(ctx, "tx.Stmt", stmt.query_text())
            .run_infallible(self.tx.stmt(ctx, stmt.inner()))
            .await;
        Stmt::new(self.scope.clone(), stmt.query_text().to_string(), inner)
    }
}
