use courier_core::{CallContext, Result};

use crate::driver::StmtApi;
use crate::scope::{ConnInfo, Scope};
use crate::types::{ExecResult, Row, Rows, Value};

/// Traced prepared statement. Keeps its query text for the `db.statement` tag.
#[derive(Debug)]
pub struct Stmt<S: StmtApi> {
    scope: Scope,
    query: String,
    stmt: S,
}

impl<S: StmtApi> Stmt<S> {
    pub(crate) const fn new(scope: Scope, query: String, stmt: S) -> Self {
        Self { scope, query, stmt }
    }

    pub fn query_text(&self) -> &str {
        &self.query
    }

    pub const fn conn_info(&self) -> &ConnInfo {
        self.scope.info()
    }

    /// Driver statement, for calls that should not be traced
    pub const fn inner(&self) -> &S {
        &self.stmt
    }

    pub async fn close(self, ctx: &CallContext) -> Result<()> {
        self.scope
            .start(ctx, "stmt.Close", "")
            .run(self.stmt.close(ctx))
            .await
    }

    pub async fn exec(&self, ctx: &CallContext, args: &[Value]) -> Result<ExecResult> {
        self.scope
            .start(ctx, "stmt.Exec", &self.query)
            .run(self.stmt.exec(ctx, args))
            .await
    }

    pub async fn query(&self, ctx: &CallContext, args: &[Value]) -> Result<Rows> {
        self.scope
            .start(ctx, "stmt.Query", &self.query)
            .run(self.stmt.query(ctx, args))
            .await
    }

    pub async fn query_row(&self, ctx: &CallContext, args: &[Value]) -> Result<Option<Row>> {
        self.scope
            .start(ctx, "stmt.QueryRow", &self.query)
            .run(self.stmt.query_row(ctx, args))
            .await
    }
}
