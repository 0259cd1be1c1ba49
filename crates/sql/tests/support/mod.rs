//! In-memory driver recording every call

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use courier_core::testing::RecordingTracer;
use courier_core::{BoxError, CallContext, Telemetry};
use courier_sql::{
    CMD_DURATION_METRIC, ConnApi, DatabaseApi, ExecResult, PoolStats, Queryer, Row, Rows,
    SqlDriver, StmtApi, TxApi, TxOptions, Value,
};

#[derive(Debug, Default)]
pub struct State {
    pub calls: Vec<String>,
    failing: HashSet<String>,
    pub max_open: Option<u32>,
    pub max_idle: Option<u32>,
    pub lifetime: Option<Option<Duration>>,
}

#[derive(Debug, Clone, Default)]
pub struct Backend(Arc<Mutex<State>>);

impl Backend {
    /// Fail calls whose query text or `<handle>.<method>` name equals `key`
    pub fn fail_on(&self, key: &str) {
        self.0.lock().unwrap().failing.insert(key.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().calls.clone()
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.0.lock().unwrap()
    }

    fn record(&self, method: &str, query: &str) -> Result<(), BoxError> {
        let mut state = self.0.lock().unwrap();
        state.calls.push(format!("{method} {query}").trim_end().to_string());
        if state.failing.contains(method) || (!query.is_empty() && state.failing.contains(query)) {
            return Err(format!("backend refused {method}").into());
        }
        Ok(())
    }
}

fn one_row() -> Rows {
    Rows {
        columns: vec!["n".to_string()],
        rows: vec![vec![Value::Int(1)]],
    }
}

fn first_row(query: &str) -> Option<Row> {
    if query.contains("nothing") {
        None
    } else {
        one_row().iter().next()
    }
}

/// Database, connection and transaction handle; `kind` prefixes recorded calls
#[derive(Debug, Clone)]
pub struct FakeHandle {
    backend: Backend,
    kind: &'static str,
}

impl FakeHandle {
    pub fn database(backend: &Backend) -> Self {
        Self {
            backend: backend.clone(),
            kind: "db",
        }
    }

    fn child(&self, kind: &'static str) -> Self {
        Self {
            backend: self.backend.clone(),
            kind,
        }
    }

    fn record(&self, method: &str, query: &str) -> Result<(), BoxError> {
        self.backend.record(&format!("{}.{method}", self.kind), query)
    }

    fn new_stmt(&self, query: &str) -> FakeStmt {
        FakeStmt {
            backend: self.backend.clone(),
            query: query.to_string(),
        }
    }
}

#[async_trait]
impl Queryer for FakeHandle {
    async fn exec(&self, _: &CallContext, query: &str, args: &[Value]) -> Result<ExecResult, BoxError> {
        self.record("exec", query)?;
        Ok(ExecResult {
            rows_affected: args.len() as u64,
            last_insert_id: None,
        })
    }

    async fn query(&self, _: &CallContext, query: &str, _: &[Value]) -> Result<Rows, BoxError> {
        self.record("query", query)?;
        Ok(one_row())
    }

    async fn query_row(
        &self,
        _: &CallContext,
        query: &str,
        _: &[Value],
    ) -> Result<Option<Row>, BoxError> {
        self.record("query_row", query)?;
        Ok(first_row(query))
    }
}

#[async_trait]
impl TxApi for FakeHandle {
    type Stmt = FakeStmt;

    async fn prepare(&self, _: &CallContext, query: &str) -> Result<FakeStmt, BoxError> {
        self.record("prepare", query)?;
        Ok(self.new_stmt(query))
    }

    async fn stmt(&self, _: &CallContext, stmt: &FakeStmt) -> FakeStmt {
        let _ = self.record("stmt", &stmt.query);
        self.new_stmt(&stmt.query)
    }

    async fn commit(&self, _: &CallContext) -> Result<(), BoxError> {
        self.record("commit", "")
    }

    async fn rollback(&self, _: &CallContext) -> Result<(), BoxError> {
        self.record("rollback", "")
    }
}

#[async_trait]
impl ConnApi for FakeHandle {
    type Stmt = FakeStmt;
    type Tx = Self;

    async fn begin_tx(&self, _: &CallContext, _: &TxOptions) -> Result<Self, BoxError> {
        self.record("begin_tx", "")?;
        Ok(self.child("tx"))
    }

    async fn prepare(&self, _: &CallContext, query: &str) -> Result<FakeStmt, BoxError> {
        self.record("prepare", query)?;
        Ok(self.new_stmt(query))
    }

    async fn ping(&self, _: &CallContext) -> Result<(), BoxError> {
        self.record("ping", "")
    }

    async fn close(&self, _: &CallContext) -> Result<(), BoxError> {
        self.record("close", "")
    }
}

#[async_trait]
impl DatabaseApi for FakeHandle {
    type Stmt = FakeStmt;
    type Tx = Self;
    type Conn = Self;

    async fn begin_tx(&self, _: &CallContext, _: &TxOptions) -> Result<Self, BoxError> {
        self.record("begin_tx", "")?;
        Ok(self.child("tx"))
    }

    async fn conn(&self, _: &CallContext) -> Result<Self, BoxError> {
        self.record("conn", "")?;
        Ok(self.child("conn"))
    }

    async fn prepare(&self, _: &CallContext, query: &str) -> Result<FakeStmt, BoxError> {
        self.record("prepare", query)?;
        Ok(self.new_stmt(query))
    }

    async fn ping(&self, _: &CallContext) -> Result<(), BoxError> {
        self.record("ping", "")
    }

    async fn close(&self, _: &CallContext) -> Result<(), BoxError> {
        self.record("close", "")
    }

    fn driver_name(&self) -> &str {
        "fake"
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            max_open_connections: self.backend.state().max_open.unwrap_or(0),
            open_connections: 1,
            idle: 1,
            ..PoolStats::default()
        }
    }

    fn set_conn_max_lifetime(&self, lifetime: Option<Duration>) {
        self.backend.state().lifetime = Some(lifetime);
    }

    fn set_max_idle_conns(&self, n: u32) {
        self.backend.state().max_idle = Some(n);
    }

    fn set_max_open_conns(&self, n: u32) {
        self.backend.state().max_open = Some(n);
    }
}

#[derive(Debug, Clone)]
pub struct FakeStmt {
    backend: Backend,
    query: String,
}

#[async_trait]
impl StmtApi for FakeStmt {
    async fn exec(&self, _: &CallContext, args: &[Value]) -> Result<ExecResult, BoxError> {
        self.backend.record("stmt.exec", &self.query)?;
        Ok(ExecResult {
            rows_affected: args.len() as u64,
            last_insert_id: Some(1),
        })
    }

    async fn query(&self, _: &CallContext, _: &[Value]) -> Result<Rows, BoxError> {
        self.backend.record("stmt.query", &self.query)?;
        Ok(one_row())
    }

    async fn query_row(&self, _: &CallContext, _: &[Value]) -> Result<Option<Row>, BoxError> {
        self.backend.record("stmt.query_row", &self.query)?;
        Ok(first_row(&self.query))
    }

    async fn close(&self, _: &CallContext) -> Result<(), BoxError> {
        self.backend.record("stmt.close", &self.query)
    }
}

/// Driver rejecting DSNs that contain `bad`
#[derive(Debug, Default)]
pub struct FakeDriver {
    pub backend: Backend,
}

impl SqlDriver for FakeDriver {
    type Database = FakeHandle;

    fn open(&self, dsn: &str) -> Result<FakeHandle, BoxError> {
        if dsn.contains("bad") {
            return Err("malformed dsn".into());
        }
        Ok(FakeHandle::database(&self.backend))
    }
}

pub fn telemetry() -> (Telemetry, RecordingTracer) {
    let tracer = RecordingTracer::new();
    (Telemetry::with_tracer(Arc::new(tracer.clone())), tracer)
}

/// Observations recorded for `op` with the given outcome
pub fn count(telemetry: &Telemetry, op: &str, success: bool) -> u64 {
    telemetry
        .registry()
        .get(CMD_DURATION_METRIC)
        .map_or(0, |series| series.with_labels(op, success).count())
}
