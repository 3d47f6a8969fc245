use crate::config::PropertyKeys;
use crate::error::{MapError, Result};
use crate::render::MapRenderer;
use crate::types::{Dataset, District, PowerStatus};
use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use serde_json::{Map, Value};
use std::io::Read;

/// Parses a GeoJSON FeatureCollection into a `Dataset`.
///
/// Every feature must carry a district name property and an areal geometry;
/// anything else fails the whole load with `MalformedInput` — no partial
/// dataset is produced. Population, status, and outage-time properties are
/// optional, and all unrecognized properties are preserved verbatim.
pub fn parse_dataset<R: Read>(keys: &PropertyKeys, reader: R) -> Result<Dataset> {
    let geojson = GeoJson::from_reader(reader)
        .map_err(|e| MapError::MalformedInput(format!("not parseable as GeoJSON: {}", e)))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(MapError::MalformedInput(
                "document must be a FeatureCollection".to_string(),
            ))
        }
    };

    let mut districts = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        districts.push(parse_feature(keys, index, feature)?);
    }

    Ok(Dataset { districts })
}

fn parse_feature(keys: &PropertyKeys, index: usize, feature: Feature) -> Result<District> {
    let mut properties = feature.properties.unwrap_or_default();

    let name = match properties.remove(&keys.name) {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(MapError::MalformedInput(format!(
                "feature {} has no '{}' property",
                index, keys.name
            )))
        }
    };

    let population_estimate = match properties.remove(&keys.population) {
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().map(|f| f.round() as u64)),
        _ => None,
    };

    let status = match properties.remove(&keys.status) {
        Some(Value::String(s)) => PowerStatus::parse(&s),
        _ => PowerStatus::Unset,
    };

    let outage_start = match properties.remove(&keys.outage_start) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    };

    let outage_end = match properties.remove(&keys.outage_end) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    };

    let geometry = parse_geometry(&name, feature.geometry)?;

    Ok(District {
        name,
        population_estimate,
        status,
        outage_start,
        outage_end,
        geometry,
        extra: properties,
    })
}

fn parse_geometry(name: &str, geometry: Option<Geometry>) -> Result<MultiPolygon<f64>> {
    let geometry = geometry.ok_or_else(|| {
        MapError::MalformedInput(format!("district '{}' has no geometry", name))
    })?;

    let converted: geo::Geometry<f64> = geometry.value.try_into().map_err(|e| {
        MapError::MalformedInput(format!("district '{}' geometry: {:?}", name, e))
    })?;

    match converted {
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        geo::Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p])),
        other => Err(MapError::MalformedInput(format!(
            "district '{}' geometry must be areal, got {}",
            name,
            geometry_kind(&other)
        ))),
    }
}

fn geometry_kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
        _ => "areal",
    }
}

/// Serializes a snapshot back to a styled FeatureCollection.
///
/// Recognized fields go out under the same property keys they came in
/// under, passthrough properties are emitted untouched, and each feature
/// gets a `style` object computed from its status so a thin client can
/// draw without knowing the styling rule.
pub fn to_feature_collection(
    dataset: &Dataset,
    keys: &PropertyKeys,
    renderer: &MapRenderer,
) -> FeatureCollection {
    let features = dataset
        .districts
        .iter()
        .map(|district| {
            let mut properties = district.extra.clone();
            properties.insert(keys.name.clone(), Value::String(district.name.clone()));
            if let Some(pop) = district.population_estimate {
                properties.insert(keys.population.clone(), Value::from(pop));
            }
            if !district.status.is_unset() {
                properties.insert(
                    keys.status.clone(),
                    Value::String(district.status.to_string()),
                );
            }
            if let Some(start) = &district.outage_start {
                properties.insert(keys.outage_start.clone(), Value::String(start.clone()));
            }
            if let Some(end) = &district.outage_end {
                properties.insert(keys.outage_end.clone(), Value::String(end.clone()));
            }

            let style = renderer.style_for(&district.status);
            let mut style_obj = Map::new();
            style_obj.insert("color".to_string(), Value::String(style.color));
            style_obj.insert("weight".to_string(), Value::from(style.weight));
            style_obj.insert("fillOpacity".to_string(), Value::from(style.fill_opacity));
            properties.insert("style".to_string(), Value::Object(style_obj));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&district.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;

    fn keys() -> PropertyKeys {
        PropertyKeys::default()
    }

    fn sample_document() -> String {
        r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {
                        "NAME_2": "Kitwe",
                        "PopEst": 517543,
                        "REGION": "Copperbelt"
                    },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[28.0, -12.0], [28.4, -12.0], [28.4, -12.8], [28.0, -12.8], [28.0, -12.0]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": {
                        "NAME_2": "Ndola",
                        "Status": "powered"
                    },
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [[[[28.5, -12.9], [28.7, -12.9], [28.7, -13.1], [28.5, -13.1], [28.5, -12.9]]]]
                    }
                }
            ]
        }"#
        .to_string()
    }

    #[test]
    fn parses_well_formed_collection() {
        let dataset = parse_dataset(&keys(), sample_document().as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);

        let kitwe = dataset.find("Kitwe").unwrap();
        assert_eq!(kitwe.population_estimate, Some(517_543));
        assert_eq!(kitwe.status, PowerStatus::Unset);
        assert_eq!(kitwe.outage_start, None);
        assert_eq!(
            kitwe.extra.get("REGION"),
            Some(&Value::String("Copperbelt".to_string()))
        );

        let ndola = dataset.find("Ndola").unwrap();
        assert_eq!(ndola.status, PowerStatus::Powered);
        assert_eq!(ndola.population_estimate, None);
    }

    #[test]
    fn rejects_non_feature_collection() {
        let doc = r#"{"type": "Point", "coordinates": [28.0, -12.0]}"#;
        let err = parse_dataset(&keys(), doc.as_bytes()).unwrap_err();
        assert!(matches!(err, MapError::MalformedInput(_)));
    }

    #[test]
    fn rejects_feature_without_name() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"PopEst": 100},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}
            }]
        }"#;
        let err = parse_dataset(&keys(), doc.as_bytes()).unwrap_err();
        assert!(matches!(err, MapError::MalformedInput(_)));
    }

    #[test]
    fn rejects_non_areal_geometry() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"NAME_2": "Kitwe"},
                "geometry": {"type": "Point", "coordinates": [28.0, -12.0]}
            }]
        }"#;
        let err = parse_dataset(&keys(), doc.as_bytes()).unwrap_err();
        assert!(matches!(err, MapError::MalformedInput(_)));
    }

    #[test]
    fn round_trip_preserves_passthrough_and_status() {
        let dataset = parse_dataset(&keys(), sample_document().as_bytes()).unwrap();
        let renderer = MapRenderer::new(MapConfig::default());
        let fc = to_feature_collection(&dataset, &keys(), &renderer);

        assert_eq!(fc.features.len(), 2);
        let kitwe = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(
            kitwe.get("REGION"),
            Some(&Value::String("Copperbelt".to_string()))
        );
        // Unset status stays absent, just like the source document.
        assert!(kitwe.get("Status").is_none());

        let ndola = fc.features[1].properties.as_ref().unwrap();
        assert_eq!(ndola.get("Status"), Some(&Value::String("powered".to_string())));
        let style = ndola.get("style").unwrap().as_object().unwrap();
        assert_eq!(style.get("color"), Some(&Value::String("green".to_string())));
    }
}
