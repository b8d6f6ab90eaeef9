//! Region-of-interest filter
//!
//! GeoJSON coordinates are WGS84 by definition, so POIs and the region are
//! compared directly without reprojection. Points are kept when they lie
//! inside the region. Areas are intersected with the region: any area that
//! overlaps it is kept, clipped to the overlapping part.

use std::path::Path;

use geo::{Area, BooleanOps, Contains, MultiPolygon, Point};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::poi::{self, Geometry, GeometryClass, Poi};

/// Union of the polygons in a region file.
#[derive(Debug, Clone)]
pub struct Region {
    area: MultiPolygon<f64>,
}

/// Outcome of filtering a collection against a [`Region`].
#[derive(Debug, Default)]
pub struct FilterReport {
    pub kept: Vec<Poi>,
    pub points_kept: usize,
    pub areas_kept: usize,
    pub uncategorized: usize,
    pub outside: usize,
    pub unsupported: usize,
}

impl Region {
    pub fn new(area: MultiPolygon<f64>) -> Self {
        Self { area }
    }

    /// Load a region from a GeoJSON FeatureCollection of (multi)polygons.
    pub fn load(path: &Path) -> Result<Self> {
        let features = poi::load(path)?;
        let region = Self::from_features(&features);
        if region.area.0.is_empty() {
            return Err(Error::EmptyInput(path.to_path_buf()));
        }
        info!(
            path = %path.display(),
            polygons = region.area.0.len(),
            "Loaded region of interest"
        );
        Ok(region)
    }

    /// Union of every polygon feature; other geometries are ignored.
    pub fn from_features(features: &[Poi]) -> Self {
        let mut area = MultiPolygon::new(Vec::new());
        for feature in features {
            match feature.geometry.as_ref().and_then(Geometry::to_multi_polygon) {
                Some(part) => area = area.union(&part),
                None => debug!("Skipping non-polygon region feature"),
            }
        }
        Self { area }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.area.contains(&Point::new(x, y))
    }

    fn contains_points(&self, geometry: &Geometry) -> bool {
        match geometry.to_geo() {
            Some(geo::Geometry::Point(point)) => self.area.contains(&point),
            Some(geo::Geometry::MultiPoint(points)) => {
                points.0.iter().any(|point| self.area.contains(point))
            }
            _ => false,
        }
    }

    /// The part of an area geometry inside the region, if it has any extent.
    pub fn clip(&self, geometry: &Geometry) -> Option<Geometry> {
        let clipped = geometry.to_multi_polygon()?.intersection(&self.area);
        (clipped.unsigned_area() > 0.0).then(|| Geometry::from_multi_polygon(&clipped))
    }

    /// Keep categorized records inside the region, points first then areas.
    pub fn filter(&self, pois: Vec<Poi>) -> FilterReport {
        let mut report = FilterReport::default();
        let mut areas = Vec::new();

        for mut poi in pois {
            if poi.category.is_none() {
                report.uncategorized += 1;
                continue;
            }
            let Some(geometry) = poi.geometry.as_ref() else {
                report.unsupported += 1;
                continue;
            };
            match geometry.class() {
                GeometryClass::Point => {
                    if self.contains_points(geometry) {
                        report.points_kept += 1;
                        report.kept.push(poi);
                    } else {
                        report.outside += 1;
                    }
                }
                GeometryClass::Area => match self.clip(geometry) {
                    Some(clipped) => {
                        poi.geometry = Some(clipped);
                        report.areas_kept += 1;
                        areas.push(poi);
                    }
                    None => report.outside += 1,
                },
                GeometryClass::Other => report.unsupported += 1,
            }
        }

        report.kept.extend(areas);
        report
    }
}
