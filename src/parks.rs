use geo::{Area, BoundingRect, Geometry, MultiPolygon, Polygon, Rect};
use geojson::GeoJson;
use serde::Deserialize;
use std::{fs, fs::File, io::Read, path::Path, str::FromStr};

use crate::error::Result;

/// Property holding the park name in the NPS boundary file.
pub const BOUNDARY_NAME_PROPERTY: &str = "UNIT_NAME";

/// Smallest marker radius in screen pixels.
const MIN_MARKER_RADIUS: f64 = 3.0;
const ACRES_TO_RADIUS: f64 = 0.000005;

/// A park drawn as a single point (parks.csv).
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ParkSite {
    #[serde(rename = "Park Name")]
    pub name: String,
    #[serde(rename = "Latitude")]
    pub lat: f64,
    #[serde(rename = "Longitude")]
    pub lon: f64,
    #[serde(rename = "Acres", default)]
    pub acres: f64,
}

impl ParkSite {
    /// Marker radius at the initial zoom, grown with park area.
    pub fn marker_radius(&self) -> f64 {
        (self.acres * ACRES_TO_RADIUS).max(MIN_MARKER_RADIUS)
    }
}

/// A park drawn with its boundary.
#[derive(Clone, Debug)]
pub struct ParkBoundary {
    pub name: String,
    pub shape: MultiPolygon<f64>,
}

impl ParkBoundary {
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.shape.bounding_rect()
    }
}

/// Whatever map feature the user picked; both shapes resolve to a park name.
#[derive(Clone, Copy, Debug)]
pub enum ParkFeature<'a> {
    Site(&'a ParkSite),
    Boundary(&'a ParkBoundary),
}

impl<'a> ParkFeature<'a> {
    pub fn park_name(&self) -> &'a str {
        match *self {
            ParkFeature::Site(site) => &site.name,
            ParkFeature::Boundary(boundary) => &boundary.name,
        }
    }

    /// Point to center the map on.
    pub fn anchor(&self) -> Option<(f64, f64)> {
        match *self {
            ParkFeature::Site(site) => Some((site.lon, site.lat)),
            ParkFeature::Boundary(boundary) => {
                boundary.bounds().map(|r| (r.center().x, r.center().y))
            }
        }
    }
}

/// All parks known to the map, as points and as boundaries.
#[derive(Clone, Debug, Default)]
pub struct ParkCatalog {
    pub sites: Vec<ParkSite>,
    pub boundaries: Vec<ParkBoundary>,
}

impl ParkCatalog {
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(sites: P, boundaries: Q) -> Result<Self> {
        let sites = load_sites(File::open(sites.as_ref())?)?;
        let raw = GeoJson::from_str(&fs::read_to_string(boundaries.as_ref())?)?;
        let boundaries = load_boundaries(raw)?;
        log::info!("Loaded {} park sites and {} boundaries", sites.len(), boundaries.len());
        Ok(Self { sites, boundaries })
    }

    /// Sorted, de-duplicated names across both layers.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .sites
            .iter()
            .map(|s| s.name.clone())
            .chain(self.boundaries.iter().map(|b| b.name.clone()))
            .filter(|n| !n.is_empty())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn site(&self, name: &str) -> Option<&ParkSite> {
        self.sites.iter().find(|s| s.name == name)
    }

    pub fn boundary(&self, name: &str) -> Option<&ParkBoundary> {
        self.boundaries.iter().find(|b| b.name == name)
    }

    /// Prefers the boundary when `boundaries` is set, falling back to the
    /// other layer when the park only exists there.
    pub fn feature(&self, name: &str, boundaries: bool) -> Option<ParkFeature<'_>> {
        let site = || self.site(name).map(ParkFeature::Site);
        let boundary = || self.boundary(name).map(ParkFeature::Boundary);
        if boundaries { boundary().or_else(site) } else { site().or_else(boundary) }
    }
}

pub fn load_sites<R: Read>(reader: R) -> Result<Vec<ParkSite>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut sites = Vec::new();
    for row in reader.deserialize::<ParkSite>() {
        match row {
            Ok(site) => sites.push(site),
            Err(e) => log::debug!("Skipping park row: {}", e),
        }
    }
    Ok(sites)
}

/// Keeps polygon features; in multipolygons, fragments under 20% of the
/// largest part are dropped.
pub fn load_boundaries(raw: GeoJson) -> Result<Vec<ParkBoundary>> {
    let mut items = Vec::new();

    if let GeoJson::FeatureCollection(fc) = raw {
        for feature in fc.features {
            let name = feature
                .properties
                .as_ref()
                .and_then(|p| p.get(BOUNDARY_NAME_PROPERTY).and_then(|v| v.as_str()))
                .unwrap_or("")
                .to_string();

            let Some(gj) = feature.geometry else { continue };
            let geom: Geometry<f64> = gj.value.try_into()?;
            let shape = match geom {
                Geometry::Polygon(p) => p.into(),
                Geometry::MultiPolygon(m) => drop_fragments(m),
                _ => continue,
            };
            items.push(ParkBoundary { name, shape });
        }
    }

    Ok(items)
}

fn drop_fragments(mp: MultiPolygon<f64>) -> MultiPolygon<f64> {
    if mp.0.len() <= 1 {
        return mp;
    }
    let max_area = mp.0.iter().map(|p| p.unsigned_area()).fold(0.0, f64::max);
    let threshold = max_area * 0.20;
    let kept: Vec<Polygon<f64>> = mp
        .0
        .iter()
        .filter(|p| p.unsigned_area() >= threshold)
        .cloned()
        .collect();
    if kept.is_empty() { mp } else { MultiPolygon(kept) }
}
