use crate::error::{OxPointsError, Result};
use crate::pool::EntityPool;
use crate::vocab::PREFIXES;
use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::{NamedNodeRef, TripleRef};
use std::io;

/// The RDF serialization and content type for an extension of the RDF family.
pub fn rdf_format_for(extension: &str) -> Option<(RdfFormat, &'static str)> {
    match extension {
        "xml" => Some((RdfFormat::RdfXml, "application/rdf+xml")),
        "ttl" => Some((RdfFormat::Turtle, "text/turtle")),
        "nt" => Some((RdfFormat::NTriples, "text/plain")),
        "n3" => Some((RdfFormat::N3, "text/n3")),
        _ => None,
    }
}

/// Serializes the direct triples of every entity of the pool.
pub fn to_rdf(pool: &EntityPool, format: RdfFormat) -> Result<String> {
    let mut serializer = RdfSerializer::from_format(format);
    for (prefix, iri) in PREFIXES {
        serializer = serializer
            .with_prefix(prefix, iri)
            .map_err(|e| OxPointsError::Io(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
    }
    let mut writer = serializer.for_writer(Vec::new());
    for entity in pool {
        for (predicate, values) in entity.direct_properties() {
            let predicate = NamedNodeRef::new_unchecked(predicate);
            for value in values {
                writer.serialize_triple(TripleRef::new(entity.uri(), predicate, value))?;
            }
        }
    }
    Ok(String::from_utf8_lossy(&writer.finish()?).into_owned())
}
