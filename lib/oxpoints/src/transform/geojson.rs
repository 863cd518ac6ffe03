use super::{jsonp, MapLayout, MapOptions, Placemark};
use crate::dataset::Snapshot;
use crate::error::Result;
use crate::pool::EntityPool;
use ::geojson::{feature, Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

/// Renders the pool as a GeoJSON feature collection of points, optionally wrapped as JSONP.
///
/// Members of a folder carry the folder name in their `folder` property.
pub fn to_geojson(
    pool: &EntityPool,
    snapshot: &Snapshot,
    options: &MapOptions,
    callback: Option<&str>,
) -> Result<String> {
    let layout = MapLayout::build(pool, snapshot, options)?;
    let mut features = Vec::new();
    for folder in &layout.folders {
        features.extend(
            folder
                .placemarks
                .iter()
                .map(|p| point_feature(p, Some(&folder.name))),
        );
    }
    features.extend(layout.placemarks.iter().map(|p| point_feature(p, None)));

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    Ok(jsonp(serde_json::to_string(&collection)?, callback))
}

fn point_feature(placemark: &Placemark, folder: Option<&str>) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("id".to_owned(), JsonValue::from(placemark.id.clone()));
    properties.insert("name".to_owned(), JsonValue::from(placemark.name.clone()));
    if let Some(folder) = folder {
        properties.insert("folder".to_owned(), JsonValue::from(folder));
    }
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            placemark.location.long,
            placemark.location.lat,
        ]))),
        id: Some(feature::Id::String(placemark.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}
