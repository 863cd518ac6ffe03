//! The loaded graph and time-indexed views over it.

use crate::entity::{lexical_form, Entity, Location};
use crate::error::{LoaderError, OxPointsError, Result};
use crate::instant::TimeInstant;
use crate::vocab::{
    is_entity_id, Ontology, Property, DCTERMS_IS_PART_OF, ENTITY_PREFIX, MAX_ENTITY_ID,
    OXP_OCCUPIES, OXP_PRIMARY_PLACE,
};
use oxigraph::io::RdfFormat;
use oxigraph::model::vocab::rdf;
use oxigraph::model::{NamedNode, NamedNodeRef, Quad, Subject, Term, TermRef};
use oxigraph::store::{StorageError, Store};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use time::OffsetDateTime;
use tracing::{debug, info};

/// Longest isPartOf chain walked when inheriting names, locations or values.
const MAX_ANCESTRY: usize = 16;

/// The points-of-interest graph, held in an in-memory store.
pub struct Dataset {
    store: Store,
    data_namespace: String,
    ontology: RwLock<Ontology>,
    start_time: OffsetDateTime,
}

impl Dataset {
    pub fn new() -> Result<Self, LoaderError> {
        Ok(Self {
            store: Store::new()?,
            data_namespace: ENTITY_PREFIX.to_owned(),
            ontology: RwLock::new(Ontology::default()),
            start_time: OffsetDateTime::now_utc(),
        })
    }

    /// Sets the namespace relative resource names are resolved against.
    #[must_use]
    pub fn with_data_namespace(mut self, data_namespace: impl Into<String>) -> Self {
        self.data_namespace = data_namespace.into();
        self
    }

    /// Loads a file, guessing its format from the extension.
    pub fn load_file(&self, path: &Path) -> Result<(), LoaderError> {
        let extension = path
            .extension()
            .and_then(OsStr::to_str)
            .unwrap_or_default();
        let format = RdfFormat::from_extension(extension)
            .ok_or_else(|| LoaderError::UnknownFormat(path.display().to_string()))?;
        let file = File::open(path).map_err(|error| LoaderError::Io {
            path: path.display().to_string(),
            error,
        })?;
        self.load_from_reader(format, BufReader::new(file))?;
        info!(path = %path.display(), "Loaded data file");
        Ok(())
    }

    /// Adds the RDF read from `reader` and registers any new classes.
    pub fn load_from_reader(&self, format: RdfFormat, reader: impl Read) -> Result<(), LoaderError> {
        self.store.load_from_reader(format, reader)?;
        self.refresh_ontology()?;
        Ok(())
    }

    /// Registers the OxPoints classes used in the data.
    pub fn refresh_ontology(&self) -> Result<(), StorageError> {
        let mut classes = BTreeSet::new();
        for quad in self
            .store
            .quads_for_pattern(None, Some(rdf::TYPE), None, None)
        {
            if let Term::NamedNode(class) = quad?.object {
                classes.insert(class);
            }
        }
        let mut ontology = self.ontology.write().unwrap_or_else(PoisonError::into_inner);
        for class in &classes {
            if ontology.register_discovered(class.as_ref()) {
                debug!(class = class.as_str(), "Registered class found in the data");
            }
        }
        Ok(())
    }

    /// Number of quads in the store.
    pub fn len(&self) -> Result<usize, StorageError> {
        self.store.len()
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        self.store.is_empty()
    }

    pub fn start_time(&self) -> OffsetDateTime {
        self.start_time
    }

    pub fn data_namespace(&self) -> &str {
        &self.data_namespace
    }

    /// The classes known when the call is made.
    pub fn ontology(&self) -> Ontology {
        self.ontology
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// A view of the data as of `instant`, or as of the start time.
    pub fn snapshot(&self, instant: Option<TimeInstant>) -> Snapshot {
        let instant = instant.unwrap_or_else(|| TimeInstant::from_date(self.start_time.date()));
        Snapshot {
            store: self.store.clone(),
            ontology: self.ontology(),
            data_namespace: self.data_namespace.clone(),
            start_time: self.start_time,
            instant,
        }
    }
}

/// The view of the dataset used to answer one query.
///
/// The store is shared with the [`Dataset`], not copied, so reads are not isolated:
/// an upload that lands while a query runs may be seen part-way through it.
#[derive(Clone)]
pub struct Snapshot {
    store: Store,
    ontology: Ontology,
    data_namespace: String,
    start_time: OffsetDateTime,
    instant: TimeInstant,
}

impl Snapshot {
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    pub fn instant(&self) -> TimeInstant {
        self.instant
    }

    pub fn start_time(&self) -> OffsetDateTime {
        self.start_time
    }

    /// Loads the entity or fails with a not-found error.
    pub fn load_entity(&self, uri: NamedNodeRef<'_>) -> Result<Entity> {
        self.try_load_entity(uri)?.ok_or_else(|| {
            OxPointsError::not_found(format!("Entity {} does not exist", uri.as_str()))
        })
    }

    /// Loads the entity, `None` when no arc leaves it.
    pub fn try_load_entity(&self, uri: NamedNodeRef<'_>) -> Result<Option<Entity>> {
        let mut types = Vec::new();
        let mut direct: BTreeMap<String, Vec<Term>> = BTreeMap::new();
        for quad in self.store.quads_for_pattern(Some(uri.into()), None, None, None) {
            let Quad {
                predicate, object, ..
            } = quad?;
            if predicate.as_ref() == rdf::TYPE {
                if let Term::NamedNode(class) = &object {
                    types.push(class.clone());
                }
            }
            let values = direct.entry(predicate.into_string()).or_default();
            if !values.contains(&object) {
                values.push(object);
            }
        }
        if direct.is_empty() {
            return Ok(None);
        }

        let mut passive: BTreeMap<String, Vec<NamedNode>> = BTreeMap::new();
        for quad in self
            .store
            .quads_for_pattern(None, None, Some(uri.into()), None)
        {
            let Quad {
                subject, predicate, ..
            } = quad?;
            if let Subject::NamedNode(subject) = subject {
                let subjects = passive.entry(predicate.into_string()).or_default();
                if !subjects.contains(&subject) {
                    subjects.push(subject);
                }
            }
        }
        Ok(Some(Entity::new(uri.into_owned(), types, direct, passive)))
    }

    pub fn resource_exists(&self, uri: NamedNodeRef<'_>) -> Result<bool> {
        Ok(self
            .store
            .quads_for_pattern(Some(uri.into()), None, None, None)
            .next()
            .transpose()?
            .is_some())
    }

    /// Subjects typed with one of `classes`.
    pub fn uris_of_types(&self, classes: &[NamedNode]) -> Result<BTreeSet<NamedNode>> {
        let mut uris = BTreeSet::new();
        for class in classes {
            for quad in self.store.quads_for_pattern(
                None,
                Some(rdf::TYPE),
                Some(class.as_ref().into()),
                None,
            ) {
                if let Subject::NamedNode(subject) = quad?.subject {
                    uris.insert(subject);
                }
            }
        }
        Ok(uris)
    }

    /// Every subject typed with a registered class.
    pub fn all_uris(&self) -> Result<BTreeSet<NamedNode>> {
        let mut uris = BTreeSet::new();
        for quad in self
            .store
            .quads_for_pattern(None, Some(rdf::TYPE), None, None)
        {
            let quad = quad?;
            let (Subject::NamedNode(subject), Term::NamedNode(class)) = (quad.subject, quad.object)
            else {
                continue;
            };
            if self.ontology.is_valid_class(class.as_str()) {
                uris.insert(subject);
            }
        }
        Ok(uris)
    }

    /// Subjects having the property, whatever its value.
    pub fn uris_with_property(&self, property: Property) -> Result<BTreeSet<NamedNode>> {
        self.subjects_matching(property, |_| true)
    }

    /// Subjects whose property has `value`, compared lexically for literal properties.
    pub fn uris_with_property_value(
        &self,
        property: Property,
        value: &str,
    ) -> Result<BTreeSet<NamedNode>> {
        if !property.is_resource_valued() {
            return self.subjects_matching(property, |object| lexical_form(object) == value);
        }
        let resource = self.resolve(value);
        if !self.resource_exists(resource.as_ref())? {
            return Err(OxPointsError::not_found(format!(
                "Resource {} does not exist",
                resource.as_str()
            )));
        }
        let mut uris = BTreeSet::new();
        for quad in self.store.quads_for_pattern(
            None,
            Some(property.iri()),
            Some(TermRef::NamedNode(resource.as_ref())),
            None,
        ) {
            if let Subject::NamedNode(subject) = quad?.subject {
                uris.insert(subject);
            }
        }
        Ok(uris)
    }

    fn subjects_matching(
        &self,
        property: Property,
        accept: impl Fn(&Term) -> bool,
    ) -> Result<BTreeSet<NamedNode>> {
        let mut uris = BTreeSet::new();
        for quad in self
            .store
            .quads_for_pattern(None, Some(property.iri()), None, None)
        {
            let quad = quad?;
            if !accept(&quad.object) {
                continue;
            }
            if let Subject::NamedNode(subject) = quad.subject {
                uris.insert(subject);
            }
        }
        Ok(uris)
    }

    /// Makes a bare resource name absolute in the data namespace.
    pub fn resolve(&self, value: &str) -> NamedNode {
        if value.starts_with(&self.data_namespace) {
            NamedNode::new_unchecked(value)
        } else {
            NamedNode::new_unchecked(format!("{}{value}", self.data_namespace))
        }
    }

    /// Highest eight digit entity id in use, 0 when there is none.
    pub fn highest_id(&self) -> Result<u64> {
        let mut highest = 0;
        for quad in self.store.quads_for_pattern(None, None, None, None) {
            let Subject::NamedNode(subject) = quad?.subject else {
                continue;
            };
            let id = subject
                .as_str()
                .strip_prefix(&self.data_namespace)
                .filter(|id| is_entity_id(id))
                .and_then(|id| id.parse::<u64>().ok());
            if let Some(id) = id {
                highest = highest.max(id);
            }
        }
        Ok(highest)
    }

    /// The id following the highest one in use.
    pub fn next_id(&self) -> Result<u64> {
        self.highest_id()?
            .checked_add(1)
            .filter(|id| *id <= MAX_ENTITY_ID)
            .ok_or_else(|| {
                OxPointsError::DataIntegrity("Every eight digit entity id is in use".to_owned())
            })
    }

    /// Value of `property` for the entity. `passive` also looks at incoming arcs,
    /// `indirect` also at the values of isPartOf ancestors.
    pub fn property_value(
        &self,
        entity: &Entity,
        property: Property,
        passive: bool,
        indirect: bool,
    ) -> Result<Option<Term>> {
        let own = |entity: &Entity| -> Option<Term> {
            entity.values(property.iri()).first().cloned().or_else(|| {
                passive
                    .then(|| entity.passive_values(property.iri()).first())
                    .flatten()
                    .map(|n| n.clone().into())
            })
        };
        if let Some(value) = own(entity) {
            return Ok(Some(value));
        }
        if !indirect {
            return Ok(None);
        }
        for ancestor in self.ancestors(entity)? {
            if let Some(value) = own(&ancestor) {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// First existing isPartOf target.
    pub fn parent_of(&self, entity: &Entity) -> Result<Option<Entity>> {
        for parent in entity.resources(DCTERMS_IS_PART_OF) {
            if let Some(parent) = self.try_load_entity(parent.as_ref())? {
                return Ok(Some(parent));
            }
        }
        Ok(None)
    }

    /// The isPartOf chain above the entity, nearest first.
    pub fn ancestors(&self, entity: &Entity) -> Result<Vec<Entity>> {
        let mut seen = HashSet::from([entity.uri().into_owned()]);
        let mut ancestors = Vec::new();
        let mut current = self.parent_of(entity)?;
        while let Some(parent) = current {
            if ancestors.len() >= MAX_ANCESTRY || !seen.insert(parent.uri().into_owned()) {
                break;
            }
            current = self.parent_of(&parent)?;
            ancestors.push(parent);
        }
        Ok(ancestors)
    }

    /// Own coordinates, else those of the primary place, the occupied places or the ancestors.
    pub fn location_of(&self, entity: &Entity) -> Result<Option<Location>> {
        if let Some(location) = entity.own_location() {
            return Ok(Some(location));
        }
        let mut seen = HashSet::from([entity.uri().into_owned()]);
        let mut pending = VecDeque::new();
        Self::queue_location_sources(entity, &mut pending);
        while let Some(uri) = pending.pop_front() {
            if seen.len() > MAX_ANCESTRY * 4 {
                break;
            }
            if !seen.insert(uri.clone()) {
                continue;
            }
            let Some(candidate) = self.try_load_entity(uri.as_ref())? else {
                continue;
            };
            if let Some(location) = candidate.own_location() {
                return Ok(Some(location));
            }
            Self::queue_location_sources(&candidate, &mut pending);
        }
        Ok(None)
    }

    fn queue_location_sources(entity: &Entity, pending: &mut VecDeque<NamedNode>) {
        for property in [OXP_PRIMARY_PLACE, OXP_OCCUPIES, DCTERMS_IS_PART_OF] {
            pending.extend(entity.resources(property).cloned());
        }
    }

    /// The name followed by the names of the ancestors, e.g. `Library, Balliol College`.
    pub fn fully_qualified_title(&self, entity: &Entity) -> Result<Option<String>> {
        let Some(name) = entity.name() else {
            return Ok(None);
        };
        let mut title = name.to_owned();
        for ancestor in self.ancestors(entity)? {
            if let Some(ancestor_name) = ancestor.name() {
                title.push_str(", ");
                title.push_str(ancestor_name);
            }
        }
        Ok(Some(title))
    }

    /// Name of the immediate parent.
    pub fn parent_name(&self, entity: &Entity) -> Result<Option<String>> {
        Ok(self
            .parent_of(entity)?
            .and_then(|p| p.name().map(str::to_owned)))
    }
}
