//! Data source name parsing
//!
//! Understands the `[driver://][user[:password]@][protocol[(address)]]/dbname[?params]`
//! layout. Only identity fields are kept; password and parameters are dropped.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // `None` only if the pattern below stops compiling
    static ref DSN_PATTERN: Option<Regex> = Regex::new(concat!(
        r"^(?P<driver>.*://)?(?:(?P<username>.*?)(?::(.*))?@)?",
        r"(?:(?P<protocol>[^\(]*)(?:\((?P<address>[^\)]*)\))?)?",
        r"/(?P<dbname>.*?)",
        r"(?:\?(?P<params>[^\?]*))?$",
    ))
    .ok();
}

/// Identity fields extracted from a DSN
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DsnInfo {
    pub driver: String,
    pub db_name: String,
    pub address: String,
    pub user: String,
    pub protocol: String,
}

/// Extract identity fields from `dsn`; `None` when it has no `/dbname` part
pub fn parse_dsn(dsn: &str) -> Option<DsnInfo> {
    let captures = DSN_PATTERN.as_ref()?.captures(dsn)?;
    let field = |name: &str| {
        captures
            .name(name)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    };
    Some(DsnInfo {
        driver: field("driver"),
        db_name: field("dbname"),
        address: field("address"),
        user: field("username"),
        protocol: field("protocol"),
    })
}
