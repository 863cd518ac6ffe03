#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod dataset;
pub mod entity;
pub mod error;
pub mod gpsbabel;
pub mod instant;
pub mod output;
pub mod pool;
pub mod query;
pub mod sparql;
pub mod transform;
pub mod vocab;

pub mod io {
    pub use oxigraph::io::RdfFormat;
}

pub mod results {
    pub use oxigraph::sparql::results::QueryResultsFormat;
}
