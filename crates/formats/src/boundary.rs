use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// One linear ring of `[lon, lat]` degree pairs.
pub type Ring = Vec<[f64; 2]>;

/// Outer ring followed by holes.
pub type Polygon = Vec<Ring>;

/// A named boundary polygon (a state or a district).
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub name: String,
    /// Name of the enclosing region as written in the source data.
    pub parent: Option<String>,
    pub polygons: Vec<Polygon>,
}

impl BoundaryFeature {
    /// Every vertex of every ring.
    pub fn vertices(&self) -> impl Iterator<Item = &[f64; 2]> + '_ {
        self.polygons.iter().flatten().flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCollection {
    pub features: Vec<BoundaryFeature>,
}

/// Property keys probed (in order) for a feature's name and parent name.
///
/// Boundary datasets disagree on naming; the first key that holds a string wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyKeys {
    pub name: Vec<String>,
    pub parent: Vec<String>,
}

impl Default for PropertyKeys {
    fn default() -> Self {
        Self {
            name: vec![
                "name".into(),
                "district".into(),
                "NAME_1".into(),
                "st_nm".into(),
            ],
            parent: vec!["state".into(), "st_nm".into(), "parent".into()],
        }
    }
}

#[derive(Debug)]
pub enum BoundaryError {
    Json(String),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryError::Json(msg) => write!(f, "JSON parse error: {msg}"),
            BoundaryError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            BoundaryError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for BoundaryError {}

impl BoundaryCollection {
    pub fn from_geojson_str(payload: &str, keys: &PropertyKeys) -> Result<Self, BoundaryError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| BoundaryError::Json(e.to_string()))?;
        Self::from_geojson_value(&value, keys)
    }

    /// Parses a `FeatureCollection` of (multi)polygons.
    ///
    /// Features without a name or with non-areal geometry are skipped with a
    /// warning; malformed coordinates are an error.
    pub fn from_geojson_value(value: &Value, keys: &PropertyKeys) -> Result<Self, BoundaryError> {
        let obj = value
            .as_object()
            .ok_or(BoundaryError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(BoundaryError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(BoundaryError::NotAFeatureCollection);
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(BoundaryError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            let feat_obj = feat_val
                .as_object()
                .ok_or(BoundaryError::InvalidFeature {
                    index,
                    reason: "feature must be an object".to_string(),
                })?;

            let empty = Map::new();
            let properties = feat_obj
                .get("properties")
                .and_then(|v| v.as_object())
                .unwrap_or(&empty);

            let Some(name) = first_string(properties, &keys.name) else {
                warn!(index, "skipping boundary feature without a name property");
                continue;
            };
            let parent = first_string(properties, &keys.parent);

            let geometry_val = feat_obj
                .get("geometry")
                .ok_or(BoundaryError::InvalidFeature {
                    index,
                    reason: "feature missing geometry".to_string(),
                })?;
            let polygons = match parse_areal_geometry(geometry_val)
                .map_err(|reason| BoundaryError::InvalidFeature { index, reason })?
            {
                Some(polygons) => polygons,
                None => {
                    warn!(index, %name, "skipping boundary feature with non-polygon geometry");
                    continue;
                }
            };

            features.push(BoundaryFeature {
                name,
                parent,
                polygons,
            });
        }

        Ok(Self { features })
    }
}

fn first_string(properties: &Map<String, Value>, keys: &[String]) -> Option<String> {
    keys.iter()
        .filter_map(|k| properties.get(k))
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// `Ok(None)` for valid but non-areal geometry types.
fn parse_areal_geometry(value: &Value) -> Result<Option<Vec<Polygon>>, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    match ty {
        "Polygon" => Ok(Some(vec![parse_polygon(coords)?])),
        "MultiPolygon" => Ok(Some(parse_multi_polygon(coords)?)),
        "Point" | "MultiPoint" | "LineString" | "MultiLineString" => Ok(None),
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_position(coords: &Value) -> Result<[f64; 2], String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok([lon, lat])
}

fn parse_ring(coords: &Value) -> Result<Ring, String> {
    let arr = coords
        .as_array()
        .ok_or("ring must be an array of positions".to_string())?;
    arr.iter().map(parse_position).collect()
}

fn parse_polygon(coords: &Value) -> Result<Polygon, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    rings.iter().map(parse_ring).collect()
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Polygon>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    polys.iter().map(parse_polygon).collect()
}
