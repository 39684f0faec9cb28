use formats::Polygon;
use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    State,
    District,
}

/// Reference to a boundary polygon in the atlas.
///
/// This is what the view state stores as a zoom target: small, serializable,
/// and resolvable against the static reference data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeometryRef {
    pub kind: RegionKind,
    pub name: String,
}

impl GeometryRef {
    pub fn state(name: impl Into<String>) -> Self {
        Self {
            kind: RegionKind::State,
            name: name.into(),
        }
    }

    pub fn district(name: impl Into<String>) -> Self {
        Self {
            kind: RegionKind::District,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    /// Parent region after name corrections (districts only).
    pub parent: Option<String>,
    pub kind: RegionKind,
    pub polygons: Vec<Polygon>,
    pub lon_lat_bounds: Aabb2,
}

impl Region {
    pub fn new(
        kind: RegionKind,
        name: String,
        parent: Option<String>,
        polygons: Vec<Polygon>,
    ) -> Self {
        let lon_lat_bounds = Aabb2::from_points(
            polygons
                .iter()
                .flatten()
                .flatten()
                .map(|p| Vec2::new(p[0], p[1])),
        );
        Self {
            name,
            parent,
            kind,
            polygons,
            lon_lat_bounds,
        }
    }

    pub fn geometry_ref(&self) -> GeometryRef {
        GeometryRef {
            kind: self.kind,
            name: self.name.clone(),
        }
    }

    pub fn vertices(&self) -> impl Iterator<Item = &[f64; 2]> + '_ {
        self.polygons.iter().flatten().flatten()
    }
}
