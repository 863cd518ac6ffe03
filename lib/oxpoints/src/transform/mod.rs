//! Renderers turning an [`EntityPool`] into one of the output formats.

mod autosuggest;
mod geojson;
mod json;
mod kml;
mod list;
mod rdf;
mod text;

pub use autosuggest::to_autosuggest;
pub use self::geojson::to_geojson;
pub use json::to_json;
pub use kml::{to_kml, KML_CONTENT_TYPE};
pub use list::to_name_list;
pub use rdf::{rdf_format_for, to_rdf};
pub use text::to_text;

use crate::dataset::Snapshot;
use crate::entity::{Entity, Location};
use crate::error::Result;
use crate::pool::EntityPool;
use crate::query::Query;
use crate::vocab::Property;
use oxigraph::model::NamedNode;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Grouping, ordering and naming options shared by the map renderers.
#[derive(Debug, Clone, Default)]
pub struct MapOptions {
    /// Entities of this class become folders of the entities related to them through the property.
    pub folder: Option<(NamedNode, Property)>,
    pub order_by: Option<Property>,
    pub display_parent_name: bool,
}

impl MapOptions {
    pub fn from_query(query: &Query) -> Self {
        Self {
            folder: query
                .arc()
                .map(|arc| (NamedNode::new_unchecked(query.folder_class_uri()), arc)),
            order_by: query.order_by(),
            display_parent_name: query.display_parent_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Placemark {
    pub id: String,
    pub name: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Folder {
    pub id: String,
    pub name: String,
    pub placemarks: Vec<Placemark>,
}

/// The content of a map: folders first, then the loose placemarks.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MapLayout {
    pub folders: Vec<Folder>,
    pub placemarks: Vec<Placemark>,
}

impl MapLayout {
    pub fn build(pool: &EntityPool, snapshot: &Snapshot, options: &MapOptions) -> Result<Self> {
        let mut layout = Self::default();
        let mut in_folder = BTreeSet::new();

        if let Some((class, arc)) = &options.folder {
            let mut folders = pool
                .iter()
                .filter(|e| e.types().contains(class))
                .collect::<Vec<_>>();
            sort_entities(&mut folders, options.order_by);
            for folder in folders {
                in_folder.insert(folder.uri().as_str().to_owned());
                let mut members = Vec::new();
                let related = folder
                    .passive_values(arc.iri())
                    .iter()
                    .chain(folder.resources(arc.iri()));
                for uri in related {
                    if members.iter().any(|m: &Entity| m.uri() == uri.as_ref()) {
                        continue;
                    }
                    if let Some(member) = snapshot.try_load_entity(uri.as_ref())? {
                        in_folder.insert(uri.as_str().to_owned());
                        members.push(member);
                    }
                }
                let mut members = members.iter().collect::<Vec<_>>();
                sort_entities(&mut members, options.order_by);
                let mut placemarks = Vec::new();
                for member in members {
                    placemarks.extend(placemark(member, snapshot, options)?);
                }
                layout.folders.push(Folder {
                    id: folder.id().to_owned(),
                    name: display_name(folder, snapshot, options)?,
                    placemarks,
                });
            }
        }

        let mut loose = pool
            .iter()
            .filter(|e| !in_folder.contains(e.uri().as_str()))
            .collect::<Vec<_>>();
        sort_entities(&mut loose, options.order_by);
        for entity in loose {
            layout.placemarks.extend(placemark(entity, snapshot, options)?);
        }
        Ok(layout)
    }
}

fn placemark(entity: &Entity, snapshot: &Snapshot, options: &MapOptions) -> Result<Option<Placemark>> {
    let Some(location) = snapshot.location_of(entity)? else {
        return Ok(None);
    };
    Ok(Some(Placemark {
        id: entity.id().to_owned(),
        name: display_name(entity, snapshot, options)?,
        location,
    }))
}

/// The entity name, suffixed with its parent's when asked for.
fn display_name(entity: &Entity, snapshot: &Snapshot, options: &MapOptions) -> Result<String> {
    let name = entity.name().unwrap_or_else(|| entity.id()).to_owned();
    if !options.display_parent_name {
        return Ok(name);
    }
    Ok(match snapshot.parent_name(entity)? {
        Some(parent) => format!("{name}, {parent}"),
        None => name,
    })
}

/// Sorts by the first value of `order_by`, entities without one last. Stable.
fn sort_entities(entities: &mut [&Entity], order_by: Option<Property>) {
    let Some(property) = order_by else {
        return;
    };
    entities.sort_by(|a, b| {
        match (a.first_value(property.iri()), b.first_value(property.iri())) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// Wraps `body` as `callback(body);` when a callback is given.
pub(crate) fn jsonp(body: String, callback: Option<&str>) -> String {
    match callback {
        Some(callback) => format!("{callback}({body});"),
        None => body,
    }
}
