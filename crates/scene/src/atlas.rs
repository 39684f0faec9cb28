use std::collections::HashMap;
use std::fmt::Write as _;

use formats::BoundaryCollection;
use foundation::bounds::Aabb2;
use foundation::math::Mercator;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::corrections::NameCorrections;
use crate::region::{GeometryRef, Region, RegionKind};

/// Pixel size of the map drawing surface.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 975.0,
            height: 610.0,
        }
    }
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtlasError {
    NoStates,
    /// The state collection has no usable extent to fit into the canvas.
    NoExtent,
}

impl std::fmt::Display for AtlasError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtlasError::NoStates => write!(f, "state boundary collection is empty"),
            AtlasError::NoExtent => write!(f, "state boundaries have no projectable extent"),
        }
    }
}

impl std::error::Error for AtlasError {}

/// Static geographic reference data: states, their districts, and the
/// projection that fits all states into the canvas.
///
/// Read-only after construction. Lookups are by (corrected) name and a miss is
/// reported as `None`, never as an error.
#[derive(Debug, Clone)]
pub struct RegionAtlas {
    canvas: Canvas,
    projection: Mercator,
    corrections: NameCorrections,
    states: Vec<Region>,
    districts: Vec<Region>,
    state_bounds: Vec<Aabb2>,
    district_bounds: Vec<Aabb2>,
    state_index: HashMap<String, usize>,
    district_index: HashMap<String, usize>,
}

impl RegionAtlas {
    pub fn build(
        states: BoundaryCollection,
        districts: BoundaryCollection,
        corrections: NameCorrections,
        canvas: Canvas,
    ) -> Result<Self, AtlasError> {
        if states.features.is_empty() {
            return Err(AtlasError::NoStates);
        }

        let states: Vec<Region> = states
            .features
            .into_iter()
            .map(|f| {
                let name = corrections.canonical_region(&f.name).to_string();
                Region::new(RegionKind::State, name, None, f.polygons)
            })
            .collect();
        let districts: Vec<Region> = districts
            .features
            .into_iter()
            .map(|f| {
                let parent = corrections.district_parent(&f.name, f.parent.as_deref());
                Region::new(RegionKind::District, f.name, parent, f.polygons)
            })
            .collect();

        let extent = states
            .iter()
            .fold(Aabb2::empty(), |acc, r| acc.union(&r.lon_lat_bounds));
        let projection = Mercator::fit_size(canvas.width, canvas.height, &extent)
            .ok_or(AtlasError::NoExtent)?;

        let state_bounds = states
            .iter()
            .map(|r| projection.project_bounds(r.vertices()))
            .collect();
        let district_bounds = districts
            .iter()
            .map(|r| projection.project_bounds(r.vertices()))
            .collect();

        let state_index = index_by_name(&states);
        let district_index = index_by_name(&districts);
        debug!(
            states = states.len(),
            districts = districts.len(),
            scale = projection.scale,
            "region atlas built"
        );

        Ok(Self {
            canvas,
            projection,
            corrections,
            states,
            districts,
            state_bounds,
            district_bounds,
            state_index,
            district_index,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn projection(&self) -> Mercator {
        self.projection
    }

    pub fn corrections(&self) -> &NameCorrections {
        &self.corrections
    }

    pub fn states(&self) -> &[Region] {
        &self.states
    }

    pub fn districts(&self) -> &[Region] {
        &self.districts
    }

    fn state_slot(&self, name: &str) -> Option<usize> {
        self.state_index
            .get(self.corrections.canonical_region(name))
            .copied()
    }

    fn district_slot(&self, name: &str) -> Option<usize> {
        self.district_index.get(name).copied()
    }

    pub fn state(&self, name: &str) -> Option<&Region> {
        self.state_slot(name).map(|i| &self.states[i])
    }

    pub fn district(&self, name: &str) -> Option<&Region> {
        self.district_slot(name).map(|i| &self.districts[i])
    }

    pub fn resolve(&self, geometry: &GeometryRef) -> Option<&Region> {
        match geometry.kind {
            RegionKind::State => self.state(&geometry.name),
            RegionKind::District => self.district(&geometry.name),
        }
    }

    /// Canvas-space bounding box of the referenced region.
    pub fn projected_bounds(&self, geometry: &GeometryRef) -> Option<Aabb2> {
        match geometry.kind {
            RegionKind::State => self.state_slot(&geometry.name).map(|i| self.state_bounds[i]),
            RegionKind::District => self
                .district_slot(&geometry.name)
                .map(|i| self.district_bounds[i]),
        }
    }

    /// Districts whose corrected parent is `state`, in source order.
    pub fn districts_of<'a>(&'a self, state: &'a str) -> impl Iterator<Item = &'a Region> + 'a {
        let state = self.corrections.canonical_region(state);
        self.districts
            .iter()
            .filter(move |d| d.parent.as_deref() == Some(state))
    }

    /// SVG path data for a region in canvas coordinates.
    pub fn path_data(&self, region: &Region) -> String {
        let mut out = String::new();
        for ring in region.polygons.iter().flatten() {
            for (i, p) in ring.iter().enumerate() {
                let v = self.projection.project(p[0], p[1]);
                let cmd = if i == 0 { 'M' } else { 'L' };
                let _ = write!(out, "{cmd}{:.2},{:.2}", v.x, v.y);
            }
            if !ring.is_empty() {
                out.push('Z');
            }
        }
        out
    }
}

fn index_by_name(regions: &[Region]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(regions.len());
    for (i, r) in regions.iter().enumerate() {
        if index.contains_key(&r.name) {
            warn!(name = %r.name, "duplicate region name; keeping first occurrence");
            continue;
        }
        index.insert(r.name.clone(), i);
    }
    index
}
