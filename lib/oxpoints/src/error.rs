use oxigraph::io::RdfParseError;
use oxigraph::sparql::{EvaluationError, SparqlSyntaxError};
use oxigraph::store::StorageError;
use std::io;

/// How an [`OxPointsError`] should be reported to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed.
    BadRequest,
    /// The requested entity or resource does not exist.
    NotFound,
    /// The request needs a capability the host does not have.
    NotImplemented,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// The HTTP status code of this kind of error.
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::NotImplemented => 501,
            ErrorKind::Internal => 500,
        }
    }

    /// Whether this kind is a consequence of the request rather than a fault of the service.
    pub fn is_anticipated(self) -> bool {
        matches!(self, ErrorKind::BadRequest | ErrorKind::NotImplemented)
    }
}

/// An error raised while answering a query.
#[derive(Debug, thiserror::Error)]
pub enum OxPointsError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    NotImplemented(String),
    /// The data holds two entities where exactly one was expected.
    #[error("{0}")]
    DataIntegrity(String),
    /// The external converter failed.
    #[error("{0}")]
    GpsBabel(String),
    #[error(transparent)]
    SparqlSyntax(#[from] SparqlSyntaxError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl OxPointsError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OxPointsError::BadRequest(_) | OxPointsError::SparqlSyntax(_) => ErrorKind::BadRequest,
            OxPointsError::NotFound(_) => ErrorKind::NotFound,
            OxPointsError::NotImplemented(_) => ErrorKind::NotImplemented,
            OxPointsError::DataIntegrity(_)
            | OxPointsError::GpsBabel(_)
            | OxPointsError::Evaluation(_)
            | OxPointsError::Storage(_)
            | OxPointsError::Io(_)
            | OxPointsError::Xml(_)
            | OxPointsError::Json(_) => ErrorKind::Internal,
        }
    }

    /// Shortcut for `self.kind().status()`.
    pub fn status(&self) -> u16 {
        self.kind().status()
    }
}

/// An error raised while loading RDF into a [`Dataset`](crate::dataset::Dataset).
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// An error raised while reading the file.
    #[error(transparent)]
    Parsing(#[from] RdfParseError),
    /// An error raised during the insertion in the store.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The file could not be opened.
    #[error("Unable to read {path}: {error}")]
    Io {
        path: String,
        #[source]
        error: io::Error,
    },
    /// No RDF format is associated with the file extension or media type.
    #[error("Unknown RDF format '{0}'")]
    UnknownFormat(String),
    #[error("{0}")]
    Other(String),
}

impl From<oxigraph::store::LoaderError> for LoaderError {
    fn from(error: oxigraph::store::LoaderError) -> Self {
        match error {
            oxigraph::store::LoaderError::Parsing(error) => Self::Parsing(error),
            oxigraph::store::LoaderError::Storage(error) => Self::Storage(error),
            other => Self::Other(other.to_string()),
        }
    }
}

pub type Result<T, E = OxPointsError> = std::result::Result<T, E>;
