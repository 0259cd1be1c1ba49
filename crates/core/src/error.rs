//! Error types shared by the client wrappers

use crate::metrics::MetricsError;

/// Boxed driver error preserved as the cause of a wrapped call failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Standard result type for wrapped client operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// A driver call failed. The driver's error is kept as the source.
    #[error("{intent}: {source}")]
    Call {
        op: String,
        intent: String,
        #[source]
        source: BoxError,
    },

    #[error("message ID is nil")]
    MissingMessageId,

    #[error("{}", join_messages(.0))]
    Aggregate(Vec<Error>),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error("Failed to load settings: {0}")]
    Settings(#[from] ::config::ConfigError),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap a driver failure for operation `op`
    pub fn call(op: impl Into<String>, intent: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Call {
            op: op.into(),
            intent: intent.into(),
            source: source.into(),
        }
    }

    /// Operation name for wrapped call failures
    pub fn op(&self) -> Option<&str> {
        match self {
            Self::Call { op, .. } => Some(op),
            _ => None,
        }
    }
}

/// Collapse independent failures into one result.
///
/// No errors is `Ok`, a single error is returned as-is, several become
/// [`Error::Aggregate`].
pub fn aggregate(errors: Vec<Error>) -> Result<()> {
    let mut errors = errors;
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(Error::Aggregate(errors)),
    }
}

fn join_messages(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
