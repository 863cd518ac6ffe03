use crate::vocab::{DC_TITLE, GEO_LAT, GEO_LONG, SKOS_ALT_LABEL, SKOS_HIDDEN_LABEL};
use oxigraph::model::{NamedNode, NamedNodeRef, Term};
use std::collections::BTreeMap;

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub long: f64,
}

/// An RDF resource of the dataset with its outgoing and incoming arcs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    uri: NamedNode,
    types: Vec<NamedNode>,
    /// Values of the arcs leaving the entity, keyed by predicate IRI.
    direct: BTreeMap<String, Vec<Term>>,
    /// Subjects of the arcs arriving at the entity, keyed by predicate IRI.
    passive: BTreeMap<String, Vec<NamedNode>>,
}

impl Entity {
    pub(crate) fn new(
        uri: NamedNode,
        types: Vec<NamedNode>,
        direct: BTreeMap<String, Vec<Term>>,
        passive: BTreeMap<String, Vec<NamedNode>>,
    ) -> Self {
        Self {
            uri,
            types,
            direct,
            passive,
        }
    }

    pub fn uri(&self) -> NamedNodeRef<'_> {
        self.uri.as_ref()
    }

    /// The last segment of the IRI, e.g. `23232373`.
    pub fn id(&self) -> &str {
        let uri = self.uri.as_str();
        uri.rfind('/').map_or(uri, |i| &uri[i + 1..])
    }

    pub fn types(&self) -> &[NamedNode] {
        &self.types
    }

    pub fn direct_properties(&self) -> impl Iterator<Item = (&str, &[Term])> {
        self.direct.iter().map(|(p, v)| (p.as_str(), v.as_slice()))
    }

    pub fn passive_properties(&self) -> impl Iterator<Item = (&str, &[NamedNode])> {
        self.passive.iter().map(|(p, v)| (p.as_str(), v.as_slice()))
    }

    pub fn values(&self, property: NamedNodeRef<'_>) -> &[Term] {
        self.direct
            .get(property.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn passive_values(&self, property: NamedNodeRef<'_>) -> &[NamedNode] {
        self.passive
            .get(property.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resource values of a direct property.
    pub fn resources(&self, property: NamedNodeRef<'_>) -> impl Iterator<Item = &NamedNode> {
        self.values(property).iter().filter_map(|t| match t {
            Term::NamedNode(n) => Some(n),
            _ => None,
        })
    }

    /// The lexical form of the first value of a direct property.
    pub fn first_value(&self, property: NamedNodeRef<'_>) -> Option<&str> {
        self.values(property).first().map(lexical_form)
    }

    pub fn literals(&self, property: NamedNodeRef<'_>) -> impl Iterator<Item = &str> {
        self.values(property).iter().filter_map(|t| match t {
            Term::Literal(l) => Some(l.value()),
            _ => None,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.literals(DC_TITLE).next()
    }

    pub fn alt_labels(&self) -> impl Iterator<Item = &str> {
        self.literals(SKOS_ALT_LABEL)
    }

    pub fn hidden_labels(&self) -> impl Iterator<Item = &str> {
        self.literals(SKOS_HIDDEN_LABEL)
    }

    /// Position from the entity's own `geo:lat` and `geo:long`.
    pub fn own_location(&self) -> Option<Location> {
        let lat = self.literals(GEO_LAT).next()?.trim().parse().ok()?;
        let long = self.literals(GEO_LONG).next()?.trim().parse().ok()?;
        Some(Location { lat, long })
    }
}

/// The literal value or the IRI of a term.
pub fn lexical_form(term: &Term) -> &str {
    match term {
        Term::NamedNode(n) => n.as_str(),
        Term::BlankNode(b) => b.as_str(),
        Term::Literal(l) => l.value(),
        #[allow(unreachable_patterns, reason = "RDF-star terms depend on a feature flag")]
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::Literal;

    fn entity() -> Entity {
        let mut direct = BTreeMap::new();
        direct.insert(
            DC_TITLE.as_str().to_owned(),
            vec![Literal::new_simple_literal("Balliol College").into()],
        );
        direct.insert(
            GEO_LAT.as_str().to_owned(),
            vec![Literal::new_simple_literal("51.7548").into()],
        );
        direct.insert(
            GEO_LONG.as_str().to_owned(),
            vec![Literal::new_simple_literal(" -1.2579").into()],
        );
        direct.insert(
            SKOS_ALT_LABEL.as_str().to_owned(),
            vec![
                Literal::new_simple_literal("Balliol").into(),
                NamedNode::new_unchecked("http://example.com/not-a-label").into(),
            ],
        );
        Entity::new(
            NamedNode::new_unchecked("http://oxpoints.oucs.ox.ac.uk/id/23232373"),
            Vec::new(),
            direct,
            BTreeMap::new(),
        )
    }

    #[test]
    fn id_is_the_last_segment() {
        assert_eq!(entity().id(), "23232373");
    }

    #[test]
    fn labels_and_names() {
        let entity = entity();
        assert_eq!(entity.name(), Some("Balliol College"));
        assert_eq!(entity.alt_labels().collect::<Vec<_>>(), ["Balliol"]);
        assert_eq!(entity.hidden_labels().count(), 0);
    }

    #[test]
    fn location_from_own_coordinates() {
        assert_eq!(
            entity().own_location(),
            Some(Location {
                lat: 51.7548,
                long: -1.2579
            })
        );
    }
}
