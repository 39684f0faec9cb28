use std::collections::HashMap;

use foundation::bounds::Aabb2;
use foundation::time::Time;
use scene::{Canvas, GeometryRef, RegionAtlas, RegionKind};
use tracing::{debug, warn};

use crate::camera::{Camera, ViewTransform};
use crate::config::ViewerConfig;
use crate::store::ViewState;

/// What the controller did with one observed view state.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// Camera animation started toward `target`.
    Animating { target: ViewTransform },
    /// Camera already heading to (or resting at) the computed target.
    Unchanged,
    /// Zoom-in request repeating the last processed sequence number.
    Suppressed { seq: u64 },
    /// Zoom target not found in the atlas (or has no extent); camera left alone.
    Unresolved { geometry: GeometryRef },
}

/// Turns view-state changes into camera animations.
#[derive(Debug, Clone)]
pub struct TransitionController {
    canvas: Canvas,
    state_fill: f64,
    district_fill: f64,
    initial_seq: u64,
    last_seq: Option<u64>,
    /// Canvas bounds already looked up, so reframing a retained parent is free.
    resolved: HashMap<GeometryRef, Aabb2>,
    lookups: usize,
    animations_started: usize,
}

impl TransitionController {
    /// `initial_seq` is the store's sequence number at mount.
    pub fn new(config: &ViewerConfig, canvas: Canvas, initial_seq: u64) -> Self {
        Self {
            canvas,
            state_fill: config.state_fill,
            district_fill: config.district_fill,
            initial_seq,
            last_seq: None,
            resolved: HashMap::new(),
            lookups: 0,
            animations_started: 0,
        }
    }

    /// Atlas lookups performed so far (cache misses).
    pub fn lookups(&self) -> usize {
        self.lookups
    }

    pub fn animations_started(&self) -> usize {
        self.animations_started
    }

    pub fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }

    pub fn observe(
        &mut self,
        state: &ViewState,
        atlas: &RegionAtlas,
        camera: &mut Camera,
        now: Time,
    ) -> TransitionOutcome {
        let seq = state.transition_seq;
        if state.zoom_target.is_some()
            && self.last_seq == Some(seq)
            && seq != self.initial_seq
        {
            debug!(seq, "duplicate zoom-in request suppressed");
            return TransitionOutcome::Suppressed { seq };
        }
        self.last_seq = Some(seq);

        let target = match &state.zoom_target {
            None => ViewTransform::IDENTITY,
            Some(geometry) => match self.frame_for(geometry, atlas) {
                Some(t) => t,
                None => {
                    warn!(
                        kind = ?geometry.kind,
                        name = %geometry.name,
                        "zoom target not found in atlas; camera not moved"
                    );
                    return TransitionOutcome::Unresolved {
                        geometry: geometry.clone(),
                    };
                }
            },
        };

        if camera.destination().approx_eq(&target) {
            return TransitionOutcome::Unchanged;
        }
        camera.animate_to(target, now);
        self.animations_started += 1;
        debug!(seq, k = target.k, x = target.x, y = target.y, "camera transition started");
        TransitionOutcome::Animating { target }
    }

    fn frame_for(&mut self, geometry: &GeometryRef, atlas: &RegionAtlas) -> Option<ViewTransform> {
        let bounds = match self.resolved.get(geometry) {
            Some(b) => *b,
            None => {
                self.lookups += 1;
                let b = atlas.projected_bounds(geometry)?;
                self.resolved.insert(geometry.clone(), b);
                b
            }
        };
        let fill = match geometry.kind {
            RegionKind::State => self.state_fill,
            RegionKind::District => self.district_fill,
        };
        fit_transform(&bounds, self.canvas, fill)
    }
}

/// Transform that centers `bounds` and scales it so its limiting axis covers
/// `fill` of the canvas.
pub fn fit_transform(bounds: &Aabb2, canvas: Canvas, fill: f64) -> Option<ViewTransform> {
    if bounds.is_degenerate() {
        return None;
    }
    let ratio = (bounds.width() / canvas.width).max(bounds.height() / canvas.height);
    let k = fill / ratio;
    let c = bounds.center();
    Some(ViewTransform::new(
        k,
        canvas.width * 0.5 - k * c.x,
        canvas.height * 0.5 - k * c.y,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Level;
    use formats::{BoundaryCollection, PropertyKeys};
    use scene::NameCorrections;

    const STATES: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"Meghalaya"},
         "geometry":{"type":"Polygon","coordinates":[[[89.8,25.0],[92.8,25.0],[92.8,26.1],[89.8,26.1],[89.8,25.0]]]}},
        {"type":"Feature","properties":{"name":"Assam"},
         "geometry":{"type":"Polygon","coordinates":[[[89.7,24.1],[96.0,24.1],[96.0,28.0],[89.7,28.0],[89.7,24.1]]]}}
    ]}"#;

    const DISTRICTS: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"district":"East Khasi Hills","st_nm":"Meghalaya"},
         "geometry":{"type":"Polygon","coordinates":[[[91.6,25.1],[92.2,25.1],[92.2,25.7],[91.6,25.7],[91.6,25.1]]]}}
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

    fn view(level: Level, target: Option<GeometryRef>, seq: u64) -> ViewState {
        let mut s = ViewState::initial("Northeast India");
        s.level = level;
        s.zoom_target = target;
        s.transition_seq = seq;
        s
    }

    fn controller(atlas: &RegionAtlas, initial_seq: u64) -> TransitionController {
        TransitionController::new(&ViewerConfig::default(), atlas.canvas(), initial_seq)
    }

    #[test]
    fn fit_uses_limiting_axis() {
        let canvas = Canvas::new(1000.0, 500.0);
        // Wide box: width ratio 0.2, height ratio 0.1.
        let b = Aabb2::new([100.0, 100.0], [300.0, 150.0]);
        let t = fit_transform(&b, canvas, 0.85).unwrap();
        assert!((t.k - 0.85 / 0.2).abs() < 1e-9);
        let center = t.apply(b.center());
        assert!((center.x - 500.0).abs() < 1e-9);
        assert!((center.y - 250.0).abs() < 1e-9);
        let framed_w = b.width() * t.k;
        assert!((framed_w - 850.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_bounds_do_not_fit() {
        let point = Aabb2::new([5.0, 5.0], [5.0, 5.0]);
        assert!(fit_transform(&point, Canvas::default(), 0.5).is_none());
    }

    #[test]
    fn state_and_district_fill_factors() {
        let atlas = atlas();
        let mut ctl = controller(&atlas, 0);
        let mut cam = Camera::new(750);
        let canvas = atlas.canvas();

        let out = ctl.observe(
            &view(Level::State, Some(GeometryRef::state("Meghalaya")), 0),
            &atlas,
            &mut cam,
            Time(0),
        );
        let TransitionOutcome::Animating { target } = out else {
            panic!("expected animation, got {out:?}");
        };
        let b = atlas
            .projected_bounds(&GeometryRef::state("Meghalaya"))
            .unwrap();
        let fill = (b.width() * target.k / canvas.width).max(b.height() * target.k / canvas.height);
        assert!((fill - 0.85).abs() < 1e-9);

        let out = ctl.observe(
            &view(Level::District, Some(GeometryRef::district("East Khasi Hills")), 1),
            &atlas,
            &mut cam,
            Time(16),
        );
        let TransitionOutcome::Animating { target } = out else {
            panic!("expected animation, got {out:?}");
        };
        let b = atlas
            .projected_bounds(&GeometryRef::district("East Khasi Hills"))
            .unwrap();
        let fill = (b.width() * target.k / canvas.width).max(b.height() * target.k / canvas.height);
        assert!((fill - 0.5).abs() < 1e-9);
    }

    #[test]
    fn duplicate_zoom_in_is_suppressed_but_zoom_out_never_is() {
        let atlas = atlas();
        let mut ctl = controller(&atlas, 0);
        let mut cam = Camera::new(750);
        let assam = Some(GeometryRef::state("Assam"));

        assert!(matches!(
            ctl.observe(&view(Level::State, assam.clone(), 3), &atlas, &mut cam, Time(0)),
            TransitionOutcome::Animating { .. }
        ));
        assert_eq!(
            ctl.observe(&view(Level::State, assam, 3), &atlas, &mut cam, Time(0)),
            TransitionOutcome::Suppressed { seq: 3 }
        );
        assert!(matches!(
            ctl.observe(&view(Level::Default, None, 3), &atlas, &mut cam, Time(0)),
            TransitionOutcome::Animating { .. }
        ));
        assert_eq!(ctl.animations_started(), 2);
    }

    #[test]
    fn initial_sequence_is_never_suppressed() {
        let atlas = atlas();
        let mut ctl = controller(&atlas, 5);
        let mut cam = Camera::new(750);
        let target = Some(GeometryRef::state("Meghalaya"));

        ctl.observe(&view(Level::State, target.clone(), 5), &atlas, &mut cam, Time(0));
        let again = ctl.observe(&view(Level::State, target, 5), &atlas, &mut cam, Time(0));
        assert_eq!(again, TransitionOutcome::Unchanged);
    }

    #[test]
    fn missing_geometry_leaves_camera_alone() {
        let atlas = atlas();
        let mut ctl = controller(&atlas, 0);
        let mut cam = Camera::new(750);
        let before = cam.clone();
        let out = ctl.observe(
            &view(Level::State, Some(GeometryRef::state("Atlantis")), 1),
            &atlas,
            &mut cam,
            Time(0),
        );
        assert_eq!(
            out,
            TransitionOutcome::Unresolved {
                geometry: GeometryRef::state("Atlantis")
            }
        );
        assert_eq!(cam, before);
    }

    #[test]
    fn reframing_a_known_geometry_skips_the_lookup() {
        let atlas = atlas();
        let mut ctl = controller(&atlas, 0);
        let mut cam = Camera::new(750);
        let meghalaya = Some(GeometryRef::state("Meghalaya"));

        ctl.observe(&view(Level::State, meghalaya.clone(), 1), &atlas, &mut cam, Time(0));
        ctl.observe(
            &view(Level::District, Some(GeometryRef::district("East Khasi Hills")), 2),
            &atlas,
            &mut cam,
            Time(0),
        );
        assert_eq!(ctl.lookups(), 2);
        ctl.observe(&view(Level::State, meghalaya, 3), &atlas, &mut cam, Time(0));
        assert_eq!(ctl.lookups(), 2);
        assert_eq!(ctl.animations_started(), 3);
    }
}
