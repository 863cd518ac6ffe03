use super::jsonp;
use crate::dataset::Snapshot;
use crate::entity::Entity;
use crate::error::Result;
use crate::pool::EntityPool;
use crate::vocab::{local_name, Property};
use oxigraph::model::vocab::{rdf, xsd};
use oxigraph::model::{Literal, NamedNode, NamedNodeRef, Term};
use serde_json::{Map, Number, Value};

/// Renders the pool as a JSON array of entity objects, optionally wrapped as JSONP.
///
/// Resource values are expanded into nested objects down to `depth` levels, the
/// entities themselves being the first level. Deeper resources appear as IRIs.
pub fn to_json(
    pool: &EntityPool,
    snapshot: &Snapshot,
    depth: u32,
    callback: Option<&str>,
) -> Result<String> {
    let mut entities = Vec::with_capacity(pool.len());
    for entity in pool {
        let mut path = vec![entity.uri().into_owned()];
        entities.push(entity_to_json(entity, snapshot, 1, depth, &mut path)?);
    }
    Ok(jsonp(
        serde_json::to_string(&Value::Array(entities))?,
        callback,
    ))
}

fn entity_to_json(
    entity: &Entity,
    snapshot: &Snapshot,
    level: u32,
    depth: u32,
    path: &mut Vec<NamedNode>,
) -> Result<Value> {
    let mut object = Map::new();
    object.insert("uri".to_owned(), Value::from(entity.uri().as_str()));
    if let Some(class) = entity.types().first() {
        let name = snapshot
            .ontology()
            .name_for_uri(class.as_ref())
            .unwrap_or_else(|| local_name(class.as_str()));
        object.insert("type".to_owned(), Value::from(name));
    }

    for (predicate, values) in entity.direct_properties() {
        let predicate = NamedNodeRef::new_unchecked(predicate);
        if predicate == rdf::TYPE {
            continue;
        }
        let key = Property::from_iri(predicate)
            .map_or_else(|| local_name(predicate.as_str()), |p| p.name());
        let mut converted = Vec::with_capacity(values.len());
        for value in values {
            converted.push(term_to_json(value, snapshot, level, depth, path)?);
        }
        let value = if converted.len() == 1 {
            converted.swap_remove(0)
        } else {
            Value::Array(converted)
        };
        object.insert(key.to_owned(), value);
    }
    Ok(Value::Object(object))
}

fn term_to_json(
    term: &Term,
    snapshot: &Snapshot,
    level: u32,
    depth: u32,
    path: &mut Vec<NamedNode>,
) -> Result<Value> {
    match term {
        Term::NamedNode(node) => {
            if level >= depth || path.contains(node) {
                return Ok(Value::from(node.as_str()));
            }
            let Some(nested) = snapshot.try_load_entity(node.as_ref())? else {
                return Ok(Value::from(node.as_str()));
            };
            path.push(node.clone());
            let value = entity_to_json(&nested, snapshot, level + 1, depth, path);
            path.pop();
            value
        }
        Term::Literal(literal) => Ok(literal_to_json(literal)),
        other => Ok(Value::from(other.to_string())),
    }
}

fn literal_to_json(literal: &Literal) -> Value {
    let datatype = literal.datatype();
    if [xsd::INTEGER, xsd::INT, xsd::LONG].contains(&datatype) {
        if let Ok(value) = literal.value().parse::<i64>() {
            return Value::from(value);
        }
    }
    if [xsd::DECIMAL, xsd::DOUBLE, xsd::FLOAT].contains(&datatype) {
        if let Some(value) = literal
            .value()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
        {
            return Value::Number(value);
        }
    }
    Value::from(literal.value())
}
