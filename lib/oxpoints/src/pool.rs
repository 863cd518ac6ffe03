use crate::dataset::Snapshot;
use crate::entity::Entity;
use crate::error::{OxPointsError, Result};
use crate::query::Participants;
use crate::vocab::Property;
use oxigraph::model::{NamedNode, NamedNodeRef};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// An ordered set of entities selected by a query, keyed by IRI.
#[derive(Debug, Clone, Default)]
pub struct EntityPool {
    entities: BTreeMap<String, Entity>,
}

impl EntityPool {
    /// Every entity typed with a registered class.
    pub fn all(snapshot: &Snapshot) -> Result<Self> {
        Self::load(snapshot, snapshot.all_uris()?)
    }

    /// Entities of any of the named types or their subclasses.
    pub fn of_types(snapshot: &Snapshot, types: &[String]) -> Result<Self> {
        let mut classes = Vec::new();
        for name in types {
            if !snapshot.ontology().is_valid_name(name) {
                return Err(OxPointsError::bad_request(format!(
                    "Found no URI matching type {name}"
                )));
            }
            classes.extend(snapshot.ontology().with_subclasses(name));
        }
        Self::load(snapshot, snapshot.uris_of_types(&classes)?)
    }

    /// Entities having `property`, restricted to the `|` separated `value`s when given.
    pub fn with_property(
        snapshot: &Snapshot,
        property: Property,
        value: Option<&str>,
    ) -> Result<Self> {
        let uris = match value {
            None => snapshot.uris_with_property(property)?,
            Some(value) => {
                let mut uris = BTreeSet::new();
                for v in value.split('|') {
                    uris.extend(snapshot.uris_with_property_value(property, v)?);
                }
                uris
            }
        };
        Self::load(snapshot, uris)
    }

    /// The named entities. Fails with not-found when one of them does not exist.
    pub fn individuals(snapshot: &Snapshot, participants: &Participants) -> Result<Self> {
        let mut pool = Self::default();
        for uri in establish_uris(snapshot, participants)? {
            pool.add(snapshot.load_entity(uri.as_ref())?);
        }
        Ok(pool)
    }

    /// Subjects pointing at one of the participants through `property`.
    pub fn active_participants(
        snapshot: &Snapshot,
        participants: &Participants,
        property: Property,
    ) -> Result<Self> {
        let mut uris = BTreeSet::new();
        for uri in establish_uris(snapshot, participants)? {
            let object = snapshot.load_entity(uri.as_ref())?;
            uris.extend(object.passive_values(property.iri()).iter().cloned());
        }
        Self::load(snapshot, uris)
    }

    /// Objects one of the participants points at through `property`.
    pub fn passive_participants(
        snapshot: &Snapshot,
        participants: &Participants,
        property: Property,
    ) -> Result<Self> {
        let mut uris = BTreeSet::new();
        for uri in establish_uris(snapshot, participants)? {
            let subject = snapshot.load_entity(uri.as_ref())?;
            uris.extend(subject.resources(property.iri()).cloned());
        }
        Self::load(snapshot, uris)
    }

    /// Drops the entities that have a value for `property`.
    pub fn without_property(
        mut self,
        snapshot: &Snapshot,
        property: Property,
        passive: bool,
        indirect: bool,
    ) -> Result<Self> {
        let mut filtered = BTreeMap::new();
        for (uri, entity) in std::mem::take(&mut self.entities) {
            if snapshot
                .property_value(&entity, property, passive, indirect)?
                .is_none()
            {
                filtered.insert(uri, entity);
            }
        }
        self.entities = filtered;
        Ok(self)
    }

    fn load(snapshot: &Snapshot, uris: impl IntoIterator<Item = NamedNode>) -> Result<Self> {
        let mut pool = Self::default();
        for uri in uris {
            if let Some(entity) = snapshot.try_load_entity(uri.as_ref())? {
                pool.add(entity);
            }
        }
        debug!(size = pool.len(), "Built entity pool");
        Ok(pool)
    }

    pub fn add(&mut self, entity: Entity) {
        self.entities
            .insert(entity.uri().as_str().to_owned(), entity);
    }

    pub fn get(&self, uri: NamedNodeRef<'_>) -> Option<&Entity> {
        self.entities.get(uri.as_str())
    }

    pub fn contains(&self, uri: NamedNodeRef<'_>) -> bool {
        self.entities.contains_key(uri.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }
}

impl<'a> IntoIterator for &'a EntityPool {
    type Item = &'a Entity;
    type IntoIter = std::collections::btree_map::Values<'a, String, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.values()
    }
}

/// Resolves the participants to entity IRIs, looking codes up through their coding property.
fn establish_uris(snapshot: &Snapshot, participants: &Participants) -> Result<Vec<NamedNode>> {
    let (coding, codes) = match participants {
        Participants::Ids(_) => return Ok(participants.uris().unwrap_or_default()),
        Participants::Codes { coding, codes } => (coding, codes),
    };
    let mut uris = Vec::new();
    for code in codes {
        let mut matches = snapshot.uris_with_property_value(*coding, code)?.into_iter();
        if let Some(uri) = matches.next() {
            if let Some(other) = matches.next() {
                return Err(OxPointsError::DataIntegrity(format!(
                    "Found two entities with {} {code}: {} and {}",
                    coding.name(),
                    uri.as_str(),
                    other.as_str()
                )));
            }
            uris.push(uri);
        }
    }
    if uris.is_empty() {
        return Err(OxPointsError::not_found(format!(
            "No resource found with coding {} and value [{}]",
            coding.name(),
            codes.join(", ")
        )));
    }
    Ok(uris)
}
