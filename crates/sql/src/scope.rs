//! Identity and instrumentation shared by a database and every handle
//! derived from it

use courier_core::metrics::SeriesOpts;
use courier_core::trace::{SpanKind, Tag, tags};
use courier_core::{Call, CallContext, Instrumentation, Result, Telemetry};

pub const COMPONENT: &str = "sql";
pub const DB_TYPE: &str = "RDBMS";
pub const CMD_DURATION_METRIC: &str = "client_sql_cmd_duration_seconds";

/// Database instance and user attached to every span
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnInfo {
    pub instance: String,
    pub user: String,
}

impl ConnInfo {
    pub fn new(instance: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            user: user.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Scope {
    info: ConnInfo,
    instrumentation: Instrumentation,
}

impl Scope {
    pub(crate) fn new(info: ConnInfo, telemetry: &Telemetry) -> Result<Self> {
        let series = SeriesOpts::new(
            "client",
            "sql",
            "cmd_duration_seconds",
            "SQL commands completed by the client.",
            "op",
        );
        Ok(Self {
            info,
            instrumentation: telemetry.instrumentation(COMPONENT, SpanKind::Client, series)?,
        })
    }

    pub(crate) const fn info(&self) -> &ConnInfo {
        &self.info
    }

    /// Open the span for `op`; the op name doubles as the metric label
    pub(crate) fn start(&self, ctx: &CallContext, op: &'static str, statement: &str) -> Call {
        self.instrumentation.start(
            ctx,
            op,
            op,
            vec![
                Tag::new(tags::DB_TYPE, DB_TYPE),
                Tag::new(tags::DB_INSTANCE, self.info.instance.clone()),
                Tag::new(tags::DB_USER, self.info.user.clone()),
                Tag::new(tags::DB_STATEMENT, statement.to_string()),
            ],
        )
    }
}
