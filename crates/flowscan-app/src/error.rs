//! Error taxonomy of the application layer.
//!
//! Hard failures surface as [`AppError`]. Recoverable conditions are values:
//! resolver warnings and per-flow batch failures never become errors.

use std::fmt;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure reported by a scan engine.
#[derive(Debug, thiserror::Error)]
pub enum ScanEngineError {
    /// The engine cannot be reached at all. Fatal for the whole operation.
    #[error("scan engine unavailable: {0}")]
    Unavailable(String),
    /// The engine ran but reported an error for this call.
    #[error("scan failed: {0}")]
    Failed(String),
    /// The engine answered with output that is not a list of scan results.
    #[error("scan engine returned malformed output: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("rule catalog unavailable: {0}")]
    Unavailable(String),
    #[error("rule catalog is malformed: {0}")]
    Malformed(String),
}

/// The collaborator call a retrieval failure belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetrievalOp {
    FlowList { search_term: Option<String> },
    FlowMetadata { version_id: String },
    StoredOverrides,
}

impl fmt::Display for RetrievalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalOp::FlowList { search_term: None } => f.write_str("fetch flow list"),
            RetrievalOp::FlowList {
                search_term: Some(term),
            } => write!(f, "fetch flow list (search '{term}')"),
            RetrievalOp::FlowMetadata { version_id } => {
                write!(f, "fetch metadata of flow version {version_id}")
            }
            RetrievalOp::StoredOverrides => f.write_str("fetch stored rule overrides"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("scan engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("{op} failed")]
    Retrieval {
        op: RetrievalOp,
        #[source]
        source: BoxError,
    },

    #[error("scanning flow '{flow_name}' failed")]
    Scan {
        flow_name: String,
        #[source]
        source: ScanEngineError,
    },
}

impl AppError {
    pub fn retrieval(op: RetrievalOp, source: anyhow::Error) -> Self {
        AppError::Retrieval {
            op,
            source: source.into(),
        }
    }

    /// Whether this error stops a batch rather than excluding one flow.
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(self, AppError::Catalog(_) | AppError::EngineUnavailable(_))
    }
}

/// Render an error with its full source chain on one line.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
