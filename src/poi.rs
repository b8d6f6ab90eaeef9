//! POI records and their GeoJSON representation
//!
//! Records travel between pipeline stages as GeoJSON FeatureCollections. The
//! derived category is stored in the `category` property; every other property
//! is a source tag.

use std::fs;
use std::path::Path;

use geo::{Centroid, Coord, LineString, MultiLineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::category::Category;
use crate::error::{Error, Result};

/// Property holding the derived category.
pub const CATEGORY_KEY: &str = "category";

/// Property holding the coarse label assigned at download time.
pub const FALLBACK_KEY: &str = "main_category";

/// Property holding the display name.
pub const NAME_KEY: &str = "name";

/// OSM element kind (`node`, `way`, `relation`) as exported by the downloader.
pub const ELEMENT_TYPE_KEY: &str = "element_type";

/// OSM element id, unique within its element kind.
pub const OSM_ID_KEY: &str = "osmid";

/// A GeoJSON position; longitude then latitude, extra ordinates ignored.
pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

/// Geometry classes the region filter evaluates separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryClass {
    Point,
    Area,
    Other,
}

impl Geometry {
    pub fn class(&self) -> GeometryClass {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => GeometryClass::Point,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => GeometryClass::Area,
            Geometry::LineString(_) | Geometry::MultiLineString(_) => GeometryClass::Other,
        }
    }

    /// The same shape as a `geo` geometry. Positions with fewer than two
    /// ordinates are skipped; a point without usable ordinates is `None`.
    pub fn to_geo(&self) -> Option<geo::Geometry<f64>> {
        let geometry = match self {
            Geometry::Point(p) => geo::Geometry::Point(coord(p)?.into()),
            Geometry::MultiPoint(points) => geo::Geometry::MultiPoint(
                points.iter().filter_map(|p| coord(p)).map(Point::from).collect(),
            ),
            Geometry::LineString(points) => geo::Geometry::LineString(line_string(points)),
            Geometry::MultiLineString(lines) => geo::Geometry::MultiLineString(
                MultiLineString::new(lines.iter().map(|l| line_string(l)).collect()),
            ),
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => {
                geo::Geometry::MultiPolygon(self.to_multi_polygon()?)
            }
        };
        Some(geometry)
    }

    /// Area geometries as a multipolygon; `None` for every other class.
    pub fn to_multi_polygon(&self) -> Option<MultiPolygon<f64>> {
        match self {
            Geometry::Polygon(rings) => Some(MultiPolygon::new(vec![polygon(rings)])),
            Geometry::MultiPolygon(parts) => {
                Some(MultiPolygon::new(parts.iter().map(|rings| polygon(rings)).collect()))
            }
            _ => None,
        }
    }

    /// A single polygon stays a `Polygon`, anything else a `MultiPolygon`.
    pub fn from_multi_polygon(area: &MultiPolygon<f64>) -> Self {
        let mut parts: Vec<Vec<Vec<Position>>> = area.0.iter().map(rings).collect();
        if parts.len() == 1 {
            Geometry::Polygon(parts.remove(0))
        } else {
            Geometry::MultiPolygon(parts)
        }
    }

    /// Representative point: the point itself, the mean of a multipoint, or
    /// the area-weighted centroid of a (multi)polygon.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        let point = self.to_geo()?.centroid()?;
        Some((point.x(), point.y()))
    }
}

fn coord(p: &[f64]) -> Option<Coord<f64>> {
    match p {
        [x, y, ..] => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

fn line_string(points: &[Position]) -> LineString<f64> {
    points.iter().filter_map(|p| coord(p)).collect()
}

fn polygon(rings: &[Vec<Position>]) -> Polygon<f64> {
    let mut rings = rings.iter().map(|ring| line_string(ring));
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.collect())
}

fn rings(polygon: &Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| vec![c.x, c.y]).collect())
        .collect()
}

/// A point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub id: Option<Value>,
    pub tags: Map<String, Value>,
    pub geometry: Option<Geometry>,
    pub category: Option<Category>,
}

impl Poi {
    pub fn new(tags: Map<String, Value>, geometry: Option<Geometry>) -> Self {
        Self {
            id: None,
            tags,
            geometry,
            category: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.tags.get(NAME_KEY).and_then(Value::as_str)
    }

    /// Ingestion-time coarse label used when no rule matches.
    pub fn fallback_label(&self) -> Option<&str> {
        self.tags.get(FALLBACK_KEY).and_then(Value::as_str)
    }

    /// The same record with its geometry reduced to a single point.
    pub fn to_point(&self) -> Option<Poi> {
        let (x, y) = self.geometry.as_ref()?.centroid()?;
        Some(Poi {
            geometry: Some(Geometry::Point(vec![x, y])),
            ..self.clone()
        })
    }

    /// Key for detecting the same record twice: the feature id, else the OSM
    /// `element_type`/`osmid` pair, else the name and representative point.
    pub fn identity(&self) -> String {
        if let Some(id) = &self.id {
            return value_key(id);
        }
        if let (Some(kind), Some(osmid)) = (
            self.tags.get(ELEMENT_TYPE_KEY).and_then(Value::as_str),
            self.tags.get(OSM_ID_KEY).filter(|v| !v.is_null()),
        ) {
            return format!("{}/{}", kind, value_key(osmid));
        }
        let name = self.name().unwrap_or_default();
        match self.geometry.as_ref().and_then(Geometry::centroid) {
            Some((x, y)) => format!("{}@{:.7},{:.7}", name, x, y),
            None => name.to_string(),
        }
    }
}

fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<Feature>,
}

impl From<Feature> for Poi {
    fn from(feature: Feature) -> Self {
        let mut tags = feature.properties.unwrap_or_default();
        let category = match tags.remove(CATEGORY_KEY) {
            Some(Value::String(label)) => label.parse().ok(),
            _ => None,
        };
        Poi {
            id: feature.id,
            tags,
            geometry: feature.geometry,
            category,
        }
    }
}

impl From<&Poi> for Feature {
    fn from(poi: &Poi) -> Self {
        let mut properties = poi.tags.clone();
        properties.insert(
            CATEGORY_KEY.to_string(),
            poi.category
                .map(|c| Value::String(c.as_str().to_string()))
                .unwrap_or(Value::Null),
        );
        Feature {
            kind: "Feature".to_string(),
            id: poi.id.clone(),
            properties: Some(properties),
            geometry: poi.geometry.clone(),
        }
    }
}

pub fn from_geojson(text: &str) -> Result<Vec<Poi>> {
    let collection: FeatureCollection = serde_json::from_str(text)?;
    if collection.kind != "FeatureCollection" {
        return Err(Error::Config(format!(
            "expected a FeatureCollection, found '{}'",
            collection.kind
        )));
    }
    Ok(collection.features.into_iter().map(Poi::from).collect())
}

pub fn to_geojson(pois: &[Poi]) -> Result<String> {
    let collection = FeatureCollection {
        kind: "FeatureCollection".to_string(),
        features: pois.iter().map(Feature::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&collection)?)
}

/// Read a FeatureCollection file. A missing file is [`Error::InputMissing`].
pub fn load(path: &Path) -> Result<Vec<Poi>> {
    if !path.exists() {
        return Err(Error::InputMissing(path.to_path_buf()));
    }
    let pois = from_geojson(&fs::read_to_string(path)?)?;
    debug!(path = %path.display(), count = pois.len(), "Loaded POIs");
    Ok(pois)
}

/// Write a FeatureCollection file, creating parent directories.
pub fn save(path: &Path, pois: &[Poi]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_geojson(pois)?)?;
    debug!(path = %path.display(), count = pois.len(), "Saved POIs");
    Ok(())
}
