use std::path::{Path, PathBuf};

use formats::{BoundaryCollection, BoundaryError, PropertyKeys};
use scene::{AtlasError, RegionAtlas};
use tracing::info;
use view::ViewerConfig;

#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: std::io::Error },
    Boundary { path: PathBuf, source: BoundaryError },
    Atlas(AtlasError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io { path, source } => write!(f, "read {}: {source}", path.display()),
            LoadError::Boundary { path, source } => write!(f, "parse {}: {source}", path.display()),
            LoadError::Atlas(e) => write!(f, "build atlas: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Boundary { source, .. } => Some(source),
            LoadError::Atlas(e) => Some(e),
        }
    }
}

pub fn read_boundaries(path: &Path, keys: &PropertyKeys) -> Result<BoundaryCollection, LoadError> {
    let payload = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    BoundaryCollection::from_geojson_str(&payload, keys).map_err(|source| LoadError::Boundary {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the state and district GeoJSON files and builds the atlas with the
/// configured property keys, name corrections and canvas.
pub fn load_atlas(
    states: &Path,
    districts: &Path,
    config: &ViewerConfig,
) -> Result<RegionAtlas, LoadError> {
    let state_features = read_boundaries(states, &config.property_keys)?;
    let district_features = read_boundaries(districts, &config.property_keys)?;
    info!(
        states = state_features.features.len(),
        districts = district_features.features.len(),
        "boundaries loaded"
    );
    RegionAtlas::build(
        state_features,
        district_features,
        config.corrections.clone(),
        config.canvas,
    )
    .map_err(LoadError::Atlas)
}
