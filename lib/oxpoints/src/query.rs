//! Translation of a request path and its parameters into a typed [`Query`].
//!
//! Slashes in the path read like dots in a method invocation:
//! `/type/College.kml` asks for every college as KML, `/23232373/occupies.json`
//! for the places entity 23232373 occupies. The extension selects the output
//! format. Parameters qualify the rendering and never change which entities
//! are selected, with the exception of `not`.

use crate::error::{OxPointsError, Result};
use crate::instant::TimeInstant;
use crate::vocab::{is_entity_id, Ontology, Property, ENTITY_PREFIX, OXP};
use oxigraph::model::NamedNode;
use percent_encoding::percent_decode_str;

pub const DEFAULT_FORMAT: &str = "xml";
pub const DEFAULT_JS_CALLBACK: &str = "oxpoints";

/// A set of entities named in the request, either by id or by an external code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Participants {
    /// Eight digit entity ids.
    Ids(Vec<String>),
    /// Codes to resolve through a coding property such as `hasOUCSCode`.
    Codes { coding: Property, codes: Vec<String> },
}

impl Participants {
    /// Validates each id and builds the set.
    pub fn from_ids(ids: &str) -> Result<Self> {
        let ids = ids
            .split(',')
            .map(|id| {
                if is_entity_id(id) {
                    Ok(id.to_owned())
                } else {
                    Err(OxPointsError::bad_request(format!("Invalid id {id}")))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::Ids(ids))
    }

    fn from_codes(coding: &str, codes: &str) -> Result<Self> {
        let coding = Property::from_abbreviation(coding)
            .ok_or_else(|| OxPointsError::bad_request(format!("Unknown coding {coding}")))?;
        Ok(Self::Codes {
            coding,
            codes: codes.split(',').map(str::to_owned).collect(),
        })
    }

    /// Entity IRIs when the participants are given by id.
    pub fn uris(&self) -> Option<Vec<NamedNode>> {
        match self {
            Participants::Ids(ids) => Some(
                ids.iter()
                    .map(|id| NamedNode::new_unchecked(format!("{ENTITY_PREFIX}{id}")))
                    .collect(),
            ),
            Participants::Codes { .. } => None,
        }
    }
}

/// The shape of the result a [`Query`] asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    /// Moment the data was loaded.
    MetaTimestamp,
    /// Names of the registered classes.
    MetaTypes,
    /// Next free entity id.
    MetaNextId,
    All,
    Individual(Participants),
    /// Entities of any of the `|` separated types.
    TypeCollection { types: Vec<String> },
    /// Entities of the types that have no value for `not`.
    NotFilteredTypeCollection { types: Vec<String>, not: Property },
    /// Entities having the property, optionally with one of the `|` separated values.
    PropertyAny {
        property: Property,
        value: Option<String>,
    },
    /// Entities whose property points at the participants (`/property/object`).
    PropertySubject {
        property: Property,
        object: Participants,
        value: Option<String>,
    },
    /// Entities the participants point at through the property (`/subject/property`).
    PropertyObject {
        subject: Participants,
        property: Property,
    },
    SparqlQuery,
}

/// A parsed request.
#[derive(Debug, Clone)]
pub struct Query {
    return_type: ReturnType,
    format: String,
    explicit_format: bool,
    arc: Option<Property>,
    order_by: Option<Property>,
    folder_class_uri: String,
    display_parent_name: bool,
    json_depth: u32,
    js_callback: Option<String>,
    search_indirect: bool,
    search_passive: bool,
    sparql_query: Option<String>,
    time_instant: Option<TimeInstant>,
}

impl Query {
    /// Parses the path info (the part of the request path below the service root) and the query parameters.
    pub fn from_request(
        path_info: Option<&str>,
        params: &[(String, String)],
        ontology: &Ontology,
    ) -> Result<Self> {
        let path_info = path_info
            .filter(|p| !p.is_empty())
            .ok_or_else(|| OxPointsError::bad_request("Expected path info"))?;

        let (spec, format) = split_format(path_info);
        let return_type = parse_result_set_spec(spec).and_then(|r| {
            r.ok_or_else(|| {
                OxPointsError::bad_request(format!("Unexpected path info {path_info}"))
            })
        })?;

        let mut query = Self {
            return_type,
            explicit_format: format.is_some(),
            format: format.unwrap_or(DEFAULT_FORMAT).to_owned(),
            arc: None,
            order_by: None,
            folder_class_uri: format!("{OXP}College"),
            display_parent_name: true,
            json_depth: 1,
            js_callback: None,
            search_indirect: false,
            search_passive: false,
            sparql_query: None,
            time_instant: None,
        };

        let mut not = None;
        for (name, value) in params {
            match name.as_str() {
                "arc" => query.arc = Some(known_property("arc", value)?),
                "orderBy" => query.order_by = Some(known_property("orderBy", value)?),
                "not" => not = Some(known_property("not", value)?),
                "folderType" => {
                    query.folder_class_uri = ontology.valid_class_uri(value).ok_or_else(|| {
                        OxPointsError::bad_request(format!("Unrecognised folder type {value}"))
                    })?;
                }
                "date" => query.time_instant = Some(value.parse()?),
                "indirect" => query.search_indirect = value == "true",
                "passive" => query.search_passive = value == "true",
                "jsCallback" => {
                    let callback: String = value
                        .chars()
                        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                        .collect();
                    query.js_callback = (!callback.is_empty()).then_some(callback);
                }
                "parentName" => {
                    if value.eq_ignore_ascii_case("false") {
                        query.display_parent_name = false;
                    }
                }
                "query" => query.sparql_query = Some(value.clone()),
                "version" => {}
                "jsonNesting" => {
                    query.json_depth = value.parse().map_err(|_| {
                        OxPointsError::bad_request(format!("Invalid jsonNesting {value}"))
                    })?;
                }
                _ => {
                    return Err(OxPointsError::bad_request(format!(
                        "Unrecognised parameter {name}:{value}"
                    )))
                }
            }
        }

        if let Some(not) = not {
            let ReturnType::TypeCollection { types } = query.return_type else {
                return Err(OxPointsError::bad_request(
                    "The not parameter only applies to type collections",
                ));
            };
            query.return_type = ReturnType::NotFilteredTypeCollection { types, not };
        }
        Ok(query)
    }

    pub fn return_type(&self) -> &ReturnType {
        &self.return_type
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// Whether the format came from the path rather than the default.
    pub fn has_explicit_format(&self) -> bool {
        self.explicit_format
    }

    pub fn arc(&self) -> Option<Property> {
        self.arc
    }

    pub fn order_by(&self) -> Option<Property> {
        self.order_by
    }

    pub fn folder_class_uri(&self) -> &str {
        &self.folder_class_uri
    }

    pub fn display_parent_name(&self) -> bool {
        self.display_parent_name
    }

    pub fn json_depth(&self) -> u32 {
        self.json_depth
    }

    /// The JSONP callback. The `js` format always has one.
    pub fn js_callback(&self) -> Option<&str> {
        match &self.js_callback {
            Some(callback) => Some(callback),
            None if self.format == "js" => Some(DEFAULT_JS_CALLBACK),
            None => None,
        }
    }

    pub fn search_indirect(&self) -> bool {
        self.search_indirect
    }

    pub fn search_passive(&self) -> bool {
        self.search_passive
    }

    pub fn sparql_query(&self) -> Option<&str> {
        self.sparql_query.as_deref()
    }

    pub fn time_instant(&self) -> Option<TimeInstant> {
        self.time_instant
    }
}

/// Splits `/type/College.kml` into `/type/College` and `kml`. Only the last segment may carry the extension.
fn split_format(path_info: &str) -> (&str, Option<&str>) {
    let last_segment = path_info.rfind('/').map_or(0, |i| i + 1);
    match path_info[last_segment..].rfind('.') {
        Some(dot) => {
            let dot = last_segment + dot;
            (&path_info[..dot], Some(&path_info[dot + 1..]))
        }
        None => (path_info, None),
    }
}

fn known_property(parameter: &str, value: &str) -> Result<Property> {
    Property::from_abbreviation(value).ok_or_else(|| {
        OxPointsError::bad_request(format!("Unrecognised {parameter} property name {value}"))
    })
}

fn parse_result_set_spec(spec: &str) -> Result<Option<ReturnType>> {
    if spec.starts_with("/timestamp") {
        return Ok(Some(ReturnType::MetaTimestamp));
    }
    if spec.starts_with("/types") || spec.starts_with("/classes") {
        return Ok(Some(ReturnType::MetaTypes));
    }
    if spec.starts_with("/next") {
        return Ok(Some(ReturnType::MetaNextId));
    }
    if spec.starts_with("/all") {
        return Ok(Some(ReturnType::All));
    }
    if let Some(ids) = spec.strip_prefix("/id/") {
        return Ok(Some(ReturnType::Individual(Participants::from_ids(ids)?)));
    }
    if let Some(types) = spec
        .strip_prefix("/type/")
        .or_else(|| spec.strip_prefix("/class/"))
    {
        return Ok(Some(ReturnType::TypeCollection {
            types: types.split('|').map(str::to_owned).collect(),
        }));
    }
    if spec.starts_with("/sparql") {
        return Ok(Some(ReturnType::SparqlQuery));
    }

    let Some(tokens) = tokens(spec) else {
        return Ok(None);
    };
    if let Some(return_type) = parse_template(&tokens)? {
        return Ok(Some(return_type));
    }
    match tokens.as_slice() {
        [name] | [name, _] => {
            let Some(property) = Property::from_abbreviation(name) else {
                return Ok(None);
            };
            let value = tokens.get(1).map(|v| v.replace('+', " "));
            Ok(Some(ReturnType::PropertyAny { property, value }))
        }
        _ => Ok(None),
    }
}

fn tokens(spec: &str) -> Option<Vec<&str>> {
    let trimmed = spec.strip_prefix('/')?;
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.split('/').collect())
}

/// Matches `/property`, `/entity`, `/property/entity` and `/entity/property`.
fn parse_template(tokens: &[&str]) -> Result<Option<ReturnType>> {
    match tokens {
        [single] => {
            if let Some(property) = Property::from_abbreviation(single) {
                return Ok(Some(ReturnType::PropertyAny {
                    property,
                    value: None,
                }));
            }
            Ok(parse_entity_spec(single)?.map(|spec| ReturnType::Individual(spec.participants)))
        }
        [first, second] => {
            if let Some(property) = Property::from_abbreviation(first) {
                return Ok(parse_entity_spec(second)?.map(|spec| ReturnType::PropertySubject {
                    property,
                    object: spec.participants,
                    value: spec.value,
                }));
            }
            let Some(spec) = parse_entity_spec(first)? else {
                return Ok(None);
            };
            Ok(
                Property::from_abbreviation(second).map(|property| ReturnType::PropertyObject {
                    subject: spec.participants,
                    property,
                }),
            )
        }
        _ => Ok(None),
    }
}

struct EntitySpec {
    participants: Participants,
    /// The raw id text, used as a literal value by [`ReturnType::PropertySubject`].
    value: Option<String>,
}

const CODINGS: [(&str, &str); 6] = [
    ("oucs:", "hasOUCSCode"),
    ("olis-aleph:", "hasOLISAlephCode"),
    ("olis:", "hasOLISCode"),
    ("obn:", "hasOBNCode"),
    ("measure:", "measureIdentifier"),
    ("finance:", "hasFinanceCode"),
];

fn parse_entity_spec(token: &str) -> Result<Option<EntitySpec>> {
    for (prefix, coding) in CODINGS {
        let Some(codes) = token.strip_prefix(prefix) else {
            continue;
        };
        let codes = if coding == "hasOLISAlephCode" {
            let plus_decoded = codes.replace('+', " ");
            percent_decode_str(&plus_decoded)
                .decode_utf8()
                .map_err(|_| OxPointsError::bad_request(format!("Invalid code {codes}")))?
                .into_owned()
        } else {
            codes.to_owned()
        };
        return Ok(Some(EntitySpec {
            participants: Participants::from_codes(coding, &codes)?,
            value: None,
        }));
    }

    let ids = token.strip_prefix("id:").or_else(|| {
        (!token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())).then_some(token)
    });
    match ids {
        Some(ids) => Ok(Some(EntitySpec {
            participants: Participants::from_ids(ids)?,
            value: Some(ids.to_owned()),
        })),
        None => Ok(None),
    }
}
