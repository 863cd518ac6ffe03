use oxpoints::dataset::Dataset;
use oxpoints::gpsbabel::DEFAULT_GPSBABEL_PATH;
use std::path::PathBuf;
use std::sync::Arc;

/// Holds the configuration for an OxPoints web server.
pub struct ServerConfig {
    /// The loaded dataset.
    pub dataset: Arc<Dataset>,
    /// The IP address or DNS name that the socket binds to.
    pub bind: String,
    /// Whether uploads to `/data` are refused.
    pub read_only: bool,
    /// Whether CORS is enabled.
    pub cors: bool,
    /// Path of the GPSBabel executable.
    pub gpsbabel: PathBuf,
    /// Public URL of the service, used in `Location` headers.
    pub base_url: String,
    /// Contact shown on error pages.
    pub admin: AdminContact,
}

impl ServerConfig {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self {
            dataset,
            bind: "localhost:7878".to_owned(),
            read_only: false,
            cors: false,
            gpsbabel: PathBuf::from(DEFAULT_GPSBABEL_PATH),
            base_url: "http://localhost:7878".to_owned(),
            admin: AdminContact::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContact {
    pub name: String,
    pub email: String,
}

impl Default for AdminContact {
    fn default() -> Self {
        Self {
            name: "OxPoints administrator".to_owned(),
            email: "oxpoints@localhost".to_owned(),
        }
    }
}
