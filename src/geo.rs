// geo.rs

use geojson::{GeoJson, Value};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::LoadError;

/// Administrative code of a département ("01", "2A", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionCode(String);

impl RegionCode {
    pub fn new(code: impl Into<String>) -> RegionCode {
        RegionCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Axis-aligned extent in lon/lat degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BBox {
    pub const EMPTY: BBox = BBox {
        min_lon: f64::MAX,
        min_lat: f64::MAX,
        max_lon: f64::MIN,
        max_lat: f64::MIN,
    };

    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon || self.min_lat > self.max_lat
    }

    pub fn extend(&mut self, (lon, lat): (f64, f64)) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    pub fn contains(&self, (lon, lat): (f64, f64)) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Grows the box by `fraction` of its span on every side, clamped to
    /// the valid lon/lat range. Degenerate spans get a minimum width.
    pub fn padded(&self, fraction: f64) -> BBox {
        let epsilon = 0.001;
        let lon_range = (self.max_lon - self.min_lon).max(epsilon);
        let lat_range = (self.max_lat - self.min_lat).max(epsilon);
        let lon_padding = lon_range * fraction;
        let lat_padding = lat_range * fraction;
        BBox {
            min_lon: (self.min_lon - lon_padding).max(-180.0),
            max_lon: (self.max_lon + lon_padding).min(180.0),
            min_lat: (self.min_lat - lat_padding).max(-90.0),
            max_lat: (self.max_lat + lat_padding).min(90.0),
        }
    }
}

/// Exterior ring first, then holes.
pub type Polygon = Vec<Vec<(f64, f64)>>;

/// One département outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub code: RegionCode,
    pub name: String,
    pub polygons: Vec<Polygon>,
    pub bbox: BBox,
}

impl Region {
    pub fn new(code: RegionCode, name: impl Into<String>, polygons: Vec<Polygon>) -> Region {
        let mut bbox = BBox::EMPTY;
        for ring in polygons.iter().flatten() {
            for &c in ring {
                bbox.extend(c);
            }
        }
        Region {
            code,
            name: name.into(),
            polygons,
            bbox,
        }
    }

    /// Even-odd test against every ring, so holes are excluded.
    pub fn contains(&self, point: (f64, f64)) -> bool {
        if self.bbox.is_empty() || !self.bbox.contains(point) {
            return false;
        }
        self.polygons.iter().any(|polygon| {
            polygon
                .iter()
                .filter(|ring| ring_contains(ring, point))
                .count()
                % 2
                == 1
        })
    }
}

fn ring_contains(ring: &[(f64, f64)], (x, y): (f64, f64)) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// All département outlines from the boundary document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryCollection {
    pub regions: Vec<Region>,
}

impl BoundaryCollection {
    pub fn bbox(&self) -> Option<BBox> {
        let bbox = self
            .regions
            .iter()
            .filter(|r| !r.bbox.is_empty())
            .fold(BBox::EMPTY, |acc, r| acc.union(&r.bbox));
        (!bbox.is_empty()).then_some(bbox)
    }

    pub fn from_geojson(geojson: GeoJson) -> Result<BoundaryCollection, LoadError> {
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(LoadError::NotAFeatureCollection);
        };

        let mut regions = Vec::with_capacity(collection.features.len());
        for feature in collection.features {
            let code = match feature.property("code") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => {
                    warn!("feature without a code property, skipping");
                    continue;
                }
            };
            let name = feature
                .property("nom")
                .and_then(|v| v.as_str())
                .unwrap_or(code.as_str())
                .to_string();

            let polygons = match feature.geometry.map(|g| g.value) {
                Some(Value::Polygon(rings)) => vec![to_polygon(rings)],
                Some(Value::MultiPolygon(polys)) => polys.into_iter().map(to_polygon).collect(),
                Some(other) => {
                    debug!(code = %code, kind = other.type_name(), "ignoring non-areal geometry");
                    Vec::new()
                }
                None => Vec::new(),
            };
            regions.push(Region::new(RegionCode::new(code), name, polygons));
        }
        Ok(BoundaryCollection { regions })
    }
}

fn to_polygon(rings: Vec<Vec<Vec<f64>>>) -> Polygon {
    rings
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .filter(|c| c.len() >= 2)
                .map(|c| (c[0], c[1]))
                .collect()
        })
        .collect()
}

pub fn read_geojson(path: &Path) -> Result<GeoJson, LoadError> {
    let file = fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = io::BufReader::new(file);
    Ok(GeoJson::from_reader(reader)?)
}

pub fn load_boundaries(path: &Path) -> Result<BoundaryCollection, LoadError> {
    BoundaryCollection::from_geojson(read_geojson(path)?)
}

/// File-level facts about the boundary document, for the info screen.
#[derive(Debug, Default, Clone)]
pub struct BoundaryInfo {
    pub file_size_kb: u64,
    pub modified_time: String,
    pub feature_count: usize,
    pub bbox: Option<BBox>,
}

impl BoundaryInfo {
    pub fn gather(path: &Path, collection: &BoundaryCollection) -> BoundaryInfo {
        let mut info = BoundaryInfo {
            feature_count: collection.regions.len(),
            bbox: collection.bbox(),
            modified_time: String::from("N/A"),
            ..BoundaryInfo::default()
        };
        if let Ok(metadata) = fs::metadata(path) {
            info.file_size_kb = metadata.len() / 1024;
            if let Ok(time) = metadata.modified() {
                let datetime: chrono::DateTime<chrono::Local> = time.into();
                info.modified_time = format!("{}", datetime.format("%Y-%m-%d %H:%M"));
            }
        }
        info
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two squares: "01" with a hole in the middle, "2A" as a MultiPolygon.
    pub(crate) const FIXTURE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "code": "01", "nom": "Ain" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [
                        [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
                        [[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 2.0], [1.0, 1.0]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": { "code": "2A", "nom": "Corse-du-Sud" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[10.0, 0.0], [12.0, 0.0], [12.0, 2.0], [10.0, 2.0], [10.0, 0.0]]],
                        [[[13.0, 0.0], [14.0, 0.0], [14.0, 1.0], [13.0, 0.0]]]
                    ]
                }
            }
        ]
    }"#;

    fn region<'a>(collection: &'a BoundaryCollection, code: &str) -> &'a Region {
        collection
            .regions
            .iter()
            .find(|r| r.code.as_str() == code)
            .unwrap()
    }

    pub(crate) fn fixture() -> BoundaryCollection {
        let geojson: GeoJson = FIXTURE.parse().unwrap();
        BoundaryCollection::from_geojson(geojson).unwrap()
    }

    #[test]
    fn reads_codes_names_and_extent() {
        let collection = fixture();
        assert_eq!(collection.regions.len(), 2);
        let ain = region(&collection, "01");
        assert_eq!(ain.name, "Ain");
        assert_eq!(ain.bbox.max_lon, 4.0);
        let corse = region(&collection, "2A");
        assert_eq!(corse.polygons.len(), 2);

        let bbox = collection.bbox().unwrap();
        assert_eq!((bbox.min_lon, bbox.max_lon), (0.0, 14.0));
        assert_eq!((bbox.min_lat, bbox.max_lat), (0.0, 4.0));
    }

    #[test]
    fn point_in_polygon_respects_holes() {
        let collection = fixture();
        let ain = region(&collection, "01");
        assert!(ain.contains((3.0, 3.0)));
        assert!(!ain.contains((1.5, 1.5)));
        assert!(!ain.contains((5.0, 1.0)));

        let corse = region(&collection, "2A");
        assert!(corse.contains((11.0, 1.0)));
        assert!(corse.contains((13.8, 0.3)));
        assert!(!corse.contains((12.5, 1.0)));
    }

    #[test]
    fn rejects_bare_geometry() {
        let geojson: GeoJson = r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#
            .parse()
            .unwrap();
        assert!(matches!(
            BoundaryCollection::from_geojson(geojson),
            Err(LoadError::NotAFeatureCollection)
        ));
    }

    #[test]
    fn load_boundaries_reads_files_and_reports_bad_json() {
        let dir = std::env::temp_dir().join(format!("thermocarte-geo-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let good = dir.join("departements.geojson");
        fs::write(&good, FIXTURE).unwrap();
        assert_eq!(load_boundaries(&good).unwrap().regions.len(), 2);

        let bad = dir.join("broken.geojson");
        fs::write(&bad, "<html>404</html>").unwrap();
        assert!(matches!(load_boundaries(&bad), Err(LoadError::Json(_))));

        assert!(matches!(
            load_boundaries(&dir.join("missing.geojson")),
            Err(LoadError::Io { .. })
        ));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn padding_grows_and_clamps() {
        let bbox = BBox {
            min_lon: -179.0,
            min_lat: 40.0,
            max_lon: 10.0,
            max_lat: 50.0,
        };
        let padded = bbox.padded(0.1);
        assert_eq!(padded.min_lon, -180.0);
        assert!((padded.max_lat - 51.0).abs() < 1e-9);
    }
}
