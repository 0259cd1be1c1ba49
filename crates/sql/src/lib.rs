//! Instrumented SQL client
//!
//! [`Db`], [`Conn`], [`Tx`] and [`Stmt`] mirror the driver's handles. Each
//! call opens a client span with `db.type`, `db.instance`, `db.user` and
//! `db.statement` tags and records
//! `client_sql_cmd_duration_seconds{op, success}`.

pub mod config;
pub mod conn;
pub mod db;
pub mod driver;
pub mod dsn;
mod scope;
pub mod stmt;
pub mod tx;
pub mod types;

pub use self::config::PoolConfig;
pub use conn::Conn;
pub use db::Db;
pub use driver::{ConnApi, DatabaseApi, Queryer, SqlDriver, StmtApi, TxApi};
pub use dsn::{DsnInfo, parse_dsn};
pub use scope::{CMD_DURATION_METRIC, COMPONENT, ConnInfo, DB_TYPE};
pub use stmt::Stmt;
pub use tx::Tx;
pub use types::{ExecResult, IsolationLevel, PoolStats, Row, Rows, TxOptions, Value};
