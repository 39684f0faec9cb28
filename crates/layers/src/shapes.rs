use std::collections::HashMap;
use std::sync::Arc;

use scene::{Region, RegionAtlas};

use crate::layer::{Layer, LayerId};
use crate::symbology::ShapeStyle;

/// Identity of the event handler bound to a mounted shape.
///
/// Stable for as long as the shape stays mounted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u64);

/// Everything a shape render depends on. Equal props mean no re-render.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeProps {
    pub selected: bool,
    pub fill: String,
    pub path: Arc<str>,
    pub handler: HandlerId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MountedShape {
    pub name: String,
    pub props: ShapeProps,
    pub hovered: bool,
    /// How many times this shape was rendered since it was mounted.
    pub renders: u64,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub mounted: usize,
    pub unmounted: usize,
    pub rerendered: usize,
    pub skipped: usize,
}

impl ReconcileReport {
    pub fn renders(&self) -> usize {
        self.mounted + self.rerendered
    }
}

/// A set of region shapes with per-shape hover and selection state.
///
/// `reconcile` diffs the desired shapes against what is mounted and only
/// re-renders shapes whose [`ShapeProps`] changed.
#[derive(Debug)]
pub struct ShapeLayer {
    id: LayerId,
    style: ShapeStyle,
    shapes: Vec<MountedShape>,
    hovered: Option<String>,
    paths: HashMap<String, Arc<str>>,
    next_handler: u64,
}

impl ShapeLayer {
    pub fn new(id: LayerId, style: ShapeStyle) -> Self {
        Self {
            id,
            style,
            shapes: Vec::new(),
            hovered: None,
            paths: HashMap::new(),
            next_handler: 0,
        }
    }

    pub fn shapes(&self) -> &[MountedShape] {
        &self.shapes
    }

    pub fn shape(&self, name: &str) -> Option<&MountedShape> {
        self.shapes.iter().find(|s| s.name == name)
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Sets the hovered shape. Takes effect on the next `reconcile`.
    pub fn set_hover(&mut self, name: Option<&str>) {
        self.hovered = name.map(str::to_string);
    }

    pub fn reconcile<'a>(
        &mut self,
        atlas: &RegionAtlas,
        regions: impl IntoIterator<Item = &'a Region>,
        selected: Option<&str>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut previous: HashMap<String, MountedShape> = std::mem::take(&mut self.shapes)
            .into_iter()
            .map(|s| (s.name.clone(), s))
            .collect();

        for region in regions {
            let path = Arc::clone(
                self.paths
                    .entry(region.name.clone())
                    .or_insert_with(|| Arc::from(atlas.path_data(region))),
            );
            let is_selected = selected == Some(region.name.as_str());
            let is_hovered = self.hovered.as_deref() == Some(region.name.as_str());
            let fill = self.style.fill_for(is_selected, is_hovered).to_string();

            let shape = match previous.remove(&region.name) {
                Some(mut shape) => {
                    let props = ShapeProps {
                        selected: is_selected,
                        fill,
                        path,
                        handler: shape.props.handler,
                    };
                    if props == shape.props {
                        report.skipped += 1;
                    } else {
                        shape.props = props;
                        shape.renders += 1;
                        report.rerendered += 1;
                    }
                    shape.hovered = is_hovered;
                    shape
                }
                None => {
                    let handler = HandlerId(self.next_handler);
                    self.next_handler += 1;
                    report.mounted += 1;
                    MountedShape {
                        name: region.name.clone(),
                        props: ShapeProps {
                            selected: is_selected,
                            fill,
                            path,
                            handler,
                        },
                        hovered: is_hovered,
                        renders: 1,
                    }
                }
            };
            self.shapes.push(shape);
        }

        report.unmounted = previous.len();
        let hovered_gone = self
            .hovered
            .as_deref()
            .is_some_and(|h| previous.contains_key(h));
        if hovered_gone {
            self.hovered = None;
        }
        report
    }
}

impl Layer for ShapeLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn mounted_len(&self) -> usize {
        self.shapes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culler::GracefulExit;
    use formats::{BoundaryCollection, PropertyKeys};
    use foundation::time::Time;
    use pretty_assertions::assert_eq;
    use scene::{Canvas, NameCorrections};

    const STATES: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"Meghalaya"},
         "geometry":{"type":"Polygon","coordinates":[[[89.8,25.0],[92.8,25.0],[92.8,26.1],[89.8,26.1],[89.8,25.0]]]}},
        {"type":"Feature","properties":{"name":"Assam"},
         "geometry":{"type":"Polygon","coordinates":[[[89.7,24.1],[96.0,24.1],[96.0,28.0],[89.7,28.0],[89.7,24.1]]]}}
    ]}"#;

    const DISTRICTS: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"district":"East Khasi Hills","st_nm":"Meghalaya"},
         "geometry":{"type":"Polygon","coordinates":[[[91.6,25.1],[92.2,25.1],[92.2,25.7],[91.6,25.1]]]}},
        {"type":"Feature","properties":{"district":"Ri Bhoi","st_nm":"Meghalaya"},
         "geometry":{"type":"Polygon","coordinates":[[[91.6,25.7],[92.3,25.7],[92.3,26.0],[91.6,25.7]]]}},
        {"type":"Feature","properties":{"district":"Kamrup","st_nm":"Assam"},
         "geometry":{"type":"Polygon","coordinates":[[[91.0,25.9],[91.9,25.9],[91.9,26.5],[91.0,25.9]]]}},
        {"type":"Feature","properties":{"district":"Dima Hasao","st_nm":"Nagaland"},
         "geometry":{"type":"Polygon","coordinates":[[[92.5,25.0],[93.3,25.0],[93.3,25.6],[92.5,25.0]]]}}
    ]}"#;

    fn atlas() -> RegionAtlas {
        let keys = PropertyKeys::default();
        RegionAtlas::build(
            BoundaryCollection::from_geojson_str(STATES, &keys).unwrap(),
            BoundaryCollection::from_geojson_str(DISTRICTS, &keys).unwrap(),
            NameCorrections::default(),
            Canvas::default(),
        )
        .unwrap()
    }

    fn names(layer: &ShapeLayer) -> Vec<&str> {
        layer.shapes().iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn unchanged_props_skip_rerender() {
        let atlas = atlas();
        let mut layer = ShapeLayer::new(LayerId::STATES, ShapeStyle::states());

        let r = layer.reconcile(&atlas, atlas.states(), None);
        assert_eq!(r.mounted, 2);
        let r = layer.reconcile(&atlas, atlas.states(), None);
        assert_eq!(
            r,
            ReconcileReport {
                skipped: 2,
                ..ReconcileReport::default()
            }
        );

        let r = layer.reconcile(&atlas, atlas.states(), Some("Assam"));
        assert_eq!(r.rerendered, 1);
        assert_eq!(r.skipped, 1);
        let assam = layer.shape("Assam").unwrap();
        assert!(assam.props.selected);
        assert_eq!(assam.props.fill, ShapeStyle::states().selected_fill);
        assert_eq!(assam.renders, 2);
    }

    #[test]
    fn hover_rerenders_only_the_hovered_shape() {
        let atlas = atlas();
        let mut layer = ShapeLayer::new(LayerId::STATES, ShapeStyle::states());
        layer.reconcile(&atlas, atlas.states(), None);
        let handler = layer.shape("Meghalaya").unwrap().props.handler;

        layer.set_hover(Some("Meghalaya"));
        let r = layer.reconcile(&atlas, atlas.states(), None);
        assert_eq!((r.rerendered, r.skipped), (1, 1));
        let m = layer.shape("Meghalaya").unwrap();
        assert!(m.hovered);
        assert_eq!(m.props.fill, ShapeStyle::states().hover_fill);
        assert_eq!(m.props.handler, handler);

        layer.set_hover(None);
        let r = layer.reconcile(&atlas, atlas.states(), None);
        assert_eq!(r.rerendered, 1);
    }

    #[test]
    fn districts_mount_and_unmount_with_scope() {
        let atlas = atlas();
        let mut scope = GracefulExit::new(800);
        let mut layer = ShapeLayer::new(LayerId::DISTRICTS, ShapeStyle::districts());

        scope.observe(Some("Meghalaya"), Time(0));
        let r = layer.reconcile(&atlas, scope.visible_districts(&atlas), None);
        assert_eq!(r.mounted, 2);
        assert_eq!(names(&layer), vec!["East Khasi Hills", "Ri Bhoi"]);

        scope.observe(Some("Assam"), Time(16));
        let r = layer.reconcile(&atlas, scope.visible_districts(&atlas), None);
        assert_eq!((r.mounted, r.unmounted), (2, 2));
        // Dima Hasao is listed under Nagaland in the raw data.
        assert_eq!(names(&layer), vec!["Kamrup", "Dima Hasao"]);
        assert_eq!(layer.mounted_len(), 2);
    }

    #[test]
    fn remount_gets_a_fresh_handler() {
        let atlas = atlas();
        let mut layer = ShapeLayer::new(LayerId::DISTRICTS, ShapeStyle::districts());
        let meghalaya: Vec<_> = atlas.districts_of("Meghalaya").collect();

        layer.reconcile(&atlas, meghalaya.iter().copied(), None);
        let first = layer.shape("Ri Bhoi").unwrap().props.handler;
        layer.set_hover(Some("Ri Bhoi"));
        layer.reconcile(&atlas, std::iter::empty(), None);
        assert_eq!(layer.hovered(), None);
        assert!(layer.is_empty());
        layer.reconcile(&atlas, meghalaya.iter().copied(), None);
        assert_ne!(layer.shape("Ri Bhoi").unwrap().props.handler, first);
    }
}
