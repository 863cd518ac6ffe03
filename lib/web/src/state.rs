use crate::config::{AdminContact, ServerConfig};
use oxpoints::dataset::Dataset;
use oxpoints::gpsbabel::GpsBabel;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub gpsbabel: Arc<GpsBabel>,
    pub read_only: bool,
    pub base_url: Arc<str>,
    pub admin: Arc<AdminContact>,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            dataset: Arc::clone(&config.dataset),
            gpsbabel: Arc::new(GpsBabel::new(config.gpsbabel.clone())),
            read_only: config.read_only,
            base_url: Arc::from(config.base_url.as_str()),
            admin: Arc::new(config.admin.clone()),
        }
    }
}
