use super::jsonp;
use crate::dataset::Snapshot;
use crate::entity::Entity;
use crate::error::Result;
use crate::pool::EntityPool;
use crate::vocab::{ClassKind, OXP_OCCUPIES};
use oxigraph::model::NamedNode;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Renders the pool as autosuggest items: `{"items": [{"id", "name", "altNames"}]}`.
///
/// Places are named by their fully qualified title. An organization occupying a
/// place of the same name within the pool is left out in favour of the place.
pub fn to_autosuggest(
    pool: &EntityPool,
    snapshot: &Snapshot,
    callback: Option<&str>,
) -> Result<String> {
    let mut by_name: BTreeMap<&str, Vec<&Entity>> = BTreeMap::new();
    for entity in pool {
        if let Some(name) = entity.name() {
            by_name.entry(name).or_default().push(entity);
        }
    }

    let mut items = Vec::new();
    for entity in pool {
        let Some(name) = entity.name() else {
            continue;
        };
        let kind = snapshot.ontology().kind_of(entity.types().iter().map(NamedNode::as_ref));
        if kind == ClassKind::Organization {
            let namesakes = by_name.get(name).map(Vec::as_slice).unwrap_or_default();
            let occupies_namesake = entity.resources(OXP_OCCUPIES).any(|place| {
                namesakes.iter().any(|other| {
                    other.uri() == place.as_ref()
                        && snapshot
                            .ontology()
                            .kind_of(other.types().iter().map(NamedNode::as_ref))
                            == ClassKind::Place
                })
            });
            if occupies_namesake {
                continue;
            }
        }

        let name = if kind == ClassKind::Place {
            snapshot
                .fully_qualified_title(entity)?
                .unwrap_or_else(|| name.to_owned())
        } else {
            name.to_owned()
        };
        let mut item = json!({ "id": entity.id(), "name": name });
        let labels = entity
            .alt_labels()
            .chain(entity.hidden_labels())
            .collect::<Vec<_>>();
        if !labels.is_empty() {
            item["altNames"] = Value::from(labels.join("\t"));
        }
        items.push(item);
    }

    let body = serde_json::to_string(&json!({ "items": items }))?;
    let mut body = jsonp(body, callback);
    body.push('\n');
    Ok(body)
}
