use crate::config::AdminContact;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use oxpoints::error::{ErrorKind, LoaderError, OxPointsError};
use quick_xml::escape::escape;

/// Details of the failed request shown on the anticipated error page.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub url: String,
    pub query: Option<String>,
    pub admin: AdminContact,
}

#[derive(thiserror::Error, Debug)]
pub enum OxPointsServerError {
    /// A bad request or a missing capability, reported with an explanatory page.
    #[error("{message}")]
    Anticipated {
        status: StatusCode,
        message: String,
        context: Box<ErrorContext>,
    },
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Server is read-only")]
    ReadOnly,
    #[error("Internal server error: {0}")]
    Internal(anyhow::Error),
}

impl OxPointsServerError {
    /// Classifies a query error, keeping the request details for the anticipated kinds.
    pub fn from_query_error(error: OxPointsError, context: ErrorContext) -> Self {
        let kind = error.kind();
        if kind.is_anticipated() {
            return Self::Anticipated {
                status: StatusCode::from_u16(kind.status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message: error.to_string(),
                context: Box::new(context),
            };
        }
        match kind {
            ErrorKind::NotFound => Self::NotFound(error.to_string()),
            ErrorKind::BadRequest | ErrorKind::NotImplemented | ErrorKind::Internal => {
                Self::Internal(error.into())
            }
        }
    }
}

impl From<LoaderError> for OxPointsServerError {
    fn from(error: LoaderError) -> Self {
        match error {
            LoaderError::Parsing(error) => Self::BadRequest(error.to_string()),
            LoaderError::UnknownFormat(format) => Self::UnsupportedMediaType(format),
            other => Self::Internal(other.into()),
        }
    }
}

impl IntoResponse for OxPointsServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            OxPointsServerError::Anticipated {
                status,
                message,
                context,
            } => {
                return (
                    status,
                    [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                    anticipated_error_page(&message, &context),
                )
                    .into_response();
            }
            OxPointsServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            OxPointsServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            OxPointsServerError::UnsupportedMediaType(msg) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg)
            }
            OxPointsServerError::ReadOnly => (
                StatusCode::FORBIDDEN,
                "Server is in read-only mode".to_owned(),
            ),
            OxPointsServerError::Internal(e) => {
                tracing::error!(error = %e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, message).into_response()
    }
}

fn anticipated_error_page(message: &str, context: &ErrorContext) -> String {
    let mut page = String::from(concat!(
        "<html><head><title>OxPoints Anticipated Error</title></head>\n",
        "<body>\n<h2>OxPoints Anticipated Error</h2>\n",
    ));
    page.push_str("<h3>");
    page.push_str(&escape(message));
    page.push_str("</h3>\n");
    page.push_str("<p>An anticipated error has occurred in the application that runs this website, ");
    page.push_str("please contact <a href='mailto:");
    page.push_str(&escape(context.admin.email.as_str()));
    page.push_str("'>");
    page.push_str(&escape(context.admin.name.as_str()));
    page.push_str("</a>, with the information given below.</p>\n");
    page.push_str("<h3>Invoked with ");
    page.push_str(&escape(context.url.as_str()));
    page.push_str("</h3>\n");
    if let Some(query) = &context.query {
        page.push_str("<h3>query ");
        page.push_str(&escape(query.as_str()));
        page.push_str("</h3>\n");
    }
    page.push_str("</body></html>\n");
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ErrorContext {
        ErrorContext {
            url: "http://localhost/type/Castle".to_owned(),
            query: Some("a=<b>".to_owned()),
            admin: AdminContact {
                name: "Ada".to_owned(),
                email: "ada@example.com".to_owned(),
            },
        }
    }

    #[test]
    fn anticipated_page_is_escaped() {
        let page = anticipated_error_page("Found no URI matching type <Castle>", &context());
        assert!(page.contains("<h3>Found no URI matching type &lt;Castle&gt;</h3>"));
        assert!(page.contains("mailto:ada@example.com'>Ada</a>"));
        assert!(page.contains("<h3>query a=&lt;b&gt;</h3>"));
    }

    #[test]
    fn query_errors_are_classified() {
        let error = OxPointsServerError::from_query_error(
            OxPointsError::bad_request("Expected path info"),
            context(),
        );
        assert!(matches!(
            error,
            OxPointsServerError::Anticipated {
                status: StatusCode::BAD_REQUEST,
                ..
            }
        ));

        let error =
            OxPointsServerError::from_query_error(OxPointsError::not_found("gone"), context());
        assert!(matches!(error, OxPointsServerError::NotFound(_)));

        let error = OxPointsServerError::from_query_error(
            OxPointsError::DataIntegrity("two".to_owned()),
            context(),
        );
        assert!(matches!(error, OxPointsServerError::Internal(_)));
    }
}
