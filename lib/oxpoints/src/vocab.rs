//! Namespaces, the property abbreviation table and the class registry.

use oxigraph::model::{NamedNode, NamedNodeRef};
use std::collections::BTreeMap;

pub const OXP: &str = "http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#";
pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const DCTERMS: &str = "http://purl.org/dc/terms/";
pub const VCARD: &str = "http://www.w3.org/2006/vcard/ns#";
pub const GEO: &str = "http://www.w3.org/2003/01/geo/wgs84_pos#";
pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";
pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const METER: &str = "http://ns.ox.ac.uk/namespace/meter/2009/09/owl#";

/// Prefix of every entity IRI.
pub const ENTITY_PREFIX: &str = "http://oxpoints.oucs.ox.ac.uk/id/";

/// Largest eight digit entity id.
pub const MAX_ENTITY_ID: u64 = 99_999_999;

/// Whether `id` is an eight digit entity id.
pub fn is_entity_id(id: &str) -> bool {
    id.len() == 8 && id.bytes().all(|b| b.is_ascii_digit())
}

/// Prefixes written by the RDF serializers.
pub const PREFIXES: [(&str, &str); 8] = [
    ("oxp", OXP),
    ("dc", DC),
    ("dcterms", DCTERMS),
    ("vCard", VCARD),
    ("geo", GEO),
    ("foaf", FOAF),
    ("skos", SKOS),
    ("meter", METER),
];

/// Namespaces tried, in order, when resolving a bare class name.
const CLASS_NAMESPACES: [&str; 4] = [OXP, DC, VCARD, GEO];

pub const DC_TITLE: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://purl.org/dc/elements/1.1/title");
pub const DCTERMS_IS_PART_OF: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://purl.org/dc/terms/isPartOf");
pub const GEO_LAT: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2003/01/geo/wgs84_pos#lat");
pub const GEO_LONG: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2003/01/geo/wgs84_pos#long");
pub const OXP_OCCUPIES: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#occupies");
pub const OXP_PRIMARY_PLACE: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#primaryPlace",
);
pub const SKOS_ALT_LABEL: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2004/02/skos/core#altLabel");
pub const SKOS_HIDDEN_LABEL: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2004/02/skos/core#hiddenLabel");

/// A property that may be named in a request path or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Property {
    name: &'static str,
    iri: NamedNodeRef<'static>,
    resource_valued: bool,
}

impl Property {
    const fn resource(name: &'static str, iri: &'static str) -> Self {
        Self {
            name,
            iri: NamedNodeRef::new_unchecked(iri),
            resource_valued: true,
        }
    }

    const fn literal(name: &'static str, iri: &'static str) -> Self {
        Self {
            name,
            iri: NamedNodeRef::new_unchecked(iri),
            resource_valued: false,
        }
    }

    /// Looks up the exact abbreviation, e.g. `isPartOf` or `hasOUCSCode`.
    pub fn from_abbreviation(abbreviation: &str) -> Option<Self> {
        PROPERTIES.iter().find(|p| p.name == abbreviation).copied()
    }

    pub fn from_iri(iri: NamedNodeRef<'_>) -> Option<Self> {
        PROPERTIES.iter().find(|p| p.iri == iri).copied()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn iri(&self) -> NamedNodeRef<'static> {
        self.iri
    }

    /// Whether values of this property are entities rather than literals.
    pub fn is_resource_valued(&self) -> bool {
        self.resource_valued
    }
}

static PROPERTIES: [Property; 20] = [
    Property::resource("isPartOf", "http://purl.org/dc/terms/isPartOf"),
    Property::resource("occupies", "http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#occupies"),
    Property::resource("member", "http://www.w3.org/2004/02/skos/core#member"),
    Property::literal("hasOUCSCode", "http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#hasOUCSCode"),
    Property::literal("hasOLISCode", "http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#hasOLISCode"),
    Property::literal(
        "hasOLISAlephCode",
        "http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#hasOLISAlephCode",
    ),
    Property::literal("hasOBNCode", "http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#hasOBNCode"),
    Property::literal(
        "hasFinanceCode",
        "http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#hasFinanceCode",
    ),
    Property::resource(
        "primaryPlace",
        "http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#primaryPlace",
    ),
    Property::literal("title", "http://purl.org/dc/elements/1.1/title"),
    Property::literal(
        "hasITHomepage",
        "http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#hasITHomepage",
    ),
    Property::literal("hasWeblearn", "http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#hasWeblearn"),
    Property::literal("homepage", "http://xmlns.com/foaf/0.1/homepage"),
    Property::literal("depiction", "http://xmlns.com/foaf/0.1/depiction"),
    Property::literal("adr", "http://www.w3.org/2006/vcard/ns#adr"),
    Property::literal("lat", "http://www.w3.org/2003/01/geo/wgs84_pos#lat"),
    Property::literal("long", "http://www.w3.org/2003/01/geo/wgs84_pos#long"),
    Property::resource("supplies", "http://ns.ox.ac.uk/namespace/meter/2009/09/owl#supplies"),
    Property::resource(
        "downstreamOf",
        "http://ns.ox.ac.uk/namespace/meter/2009/09/owl#downstreamOf",
    ),
    Property::literal(
        "measureIdentifier",
        "http://ns.ox.ac.uk/namespace/meter/2009/09/owl#measureIdentifier",
    ),
];

/// The broad family a class belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Organization,
    Place,
    Other,
}

#[derive(Debug, Clone)]
struct OntologyClass {
    iri: NamedNode,
    parent: Option<String>,
}

/// Registry of the entity classes the service knows about, keyed by local name.
#[derive(Debug, Clone)]
pub struct Ontology {
    classes: BTreeMap<String, OntologyClass>,
}

const ORGANIZATIONS: [&str; 10] = [
    "College",
    "Hall",
    "Department",
    "Faculty",
    "Division",
    "Unit",
    "Library",
    "SubLibrary",
    "Museum",
    "Group",
];

const PLACES: [&str; 8] = [
    "Building", "Site", "Room", "Space", "Carpark", "Entrance", "WAP", "Field",
];

impl Default for Ontology {
    fn default() -> Self {
        let mut ontology = Self {
            classes: BTreeMap::new(),
        };
        ontology.register(format!("{OXP}Organization"), None);
        ontology.register(format!("{OXP}Place"), None);
        for name in ORGANIZATIONS {
            ontology.register(format!("{OXP}{name}"), Some("Organization"));
        }
        for name in PLACES {
            ontology.register(format!("{OXP}{name}"), Some("Place"));
        }
        ontology.register(format!("{VCARD}Address"), None);
        ontology.register(format!("{GEO}SpatialThing"), None);
        ontology.register(format!("{GEO}Point"), Some("SpatialThing"));
        ontology
    }
}

impl Ontology {
    /// Registers a class IRI under its local name. An already registered name is left untouched.
    pub fn register(&mut self, iri: String, parent: Option<&str>) {
        let name = local_name(&iri).to_owned();
        if name.is_empty() || self.classes.contains_key(&name) {
            return;
        }
        self.classes.insert(
            name,
            OntologyClass {
                iri: NamedNode::new_unchecked(iri),
                parent: parent.map(str::to_owned),
            },
        );
    }

    /// Registers a class seen in the data if it lives in the OxPoints namespace.
    pub fn register_discovered(&mut self, iri: NamedNodeRef<'_>) -> bool {
        let Some(name) = iri.as_str().strip_prefix(OXP) else {
            return false;
        };
        if self.classes.contains_key(name) {
            return false;
        }
        self.register(iri.as_str().to_owned(), None);
        true
    }

    pub fn is_valid_name(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn uri_for_name(&self, name: &str) -> Option<NamedNodeRef<'_>> {
        self.classes.get(name).map(|c| c.iri.as_ref())
    }

    pub fn name_for_uri(&self, iri: NamedNodeRef<'_>) -> Option<&str> {
        self.classes
            .iter()
            .find(|(_, c)| c.iri.as_ref() == iri)
            .map(|(name, _)| name.as_str())
    }

    pub fn is_valid_class(&self, iri: &str) -> bool {
        self.classes.values().any(|c| c.iri.as_str() == iri)
    }

    /// Sorted local names of every registered class.
    pub fn class_names(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    /// Resolves a bare class name against the known namespaces, in priority order.
    pub fn valid_class_uri(&self, name: &str) -> Option<String> {
        CLASS_NAMESPACES
            .iter()
            .map(|ns| format!("{ns}{name}"))
            .find(|iri| self.is_valid_class(iri))
    }

    /// The class itself followed by every registered descendant.
    pub fn with_subclasses(&self, name: &str) -> Vec<NamedNode> {
        let mut found = Vec::new();
        let mut pending = vec![name.to_owned()];
        while let Some(current) = pending.pop() {
            let Some(class) = self.classes.get(&current) else {
                continue;
            };
            if found.contains(&class.iri) {
                continue;
            }
            found.push(class.iri.clone());
            pending.extend(
                self.classes
                    .iter()
                    .filter(|(_, c)| c.parent.as_deref() == Some(current.as_str()))
                    .map(|(n, _)| n.clone()),
            );
        }
        found
    }

    pub fn is_subclass_of(&self, name: &str, ancestor: &str) -> bool {
        let mut current = Some(name);
        let mut steps = 0;
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.classes.len() {
                return false;
            }
            current = self.classes.get(n).and_then(|c| c.parent.as_deref());
        }
        false
    }

    /// Classifies an entity by its types.
    pub fn kind_of<'a>(&self, types: impl IntoIterator<Item = NamedNodeRef<'a>>) -> ClassKind {
        let mut kind = ClassKind::Other;
        for t in types {
            let Some(name) = self.name_for_uri(t) else {
                continue;
            };
            if self.is_subclass_of(name, "Place") {
                return ClassKind::Place;
            }
            if self.is_subclass_of(name, "Organization") {
                kind = ClassKind::Organization;
            }
        }
        kind
    }
}

/// The part of an IRI after its last `#` or `/`.
pub fn local_name(iri: &str) -> &str {
    iri.rfind(['#', '/']).map_or(iri, |i| &iri[i + 1..])
}
