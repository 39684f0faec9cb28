use foundation::math::Vec2;
use layers::{
    GracefulExit, Layer, LayerId, MountedShape, ScopeChange, ShapeLayer, ShapeStyle,
};
use runtime::{EventBus, Frame};
use scene::{GeometryRef, RegionAtlas, RegionKind};
use session::SessionStore;
use tracing::{debug, warn};
use view::{
    Camera, ConfigError, Level, ListenerId, Router, Selection, StoreSettings, SvgTransformAttr,
    Tooltip, TransitionController, TransitionOutcome, ViewError, ViewState, ViewStore,
    ViewTransform, ViewerConfig, explore_route,
};

use crate::script::Step;

/// Fields whose change makes the transition controller look at the state again.
#[derive(Debug, Clone, PartialEq)]
struct TransitionKey {
    level: Level,
    state: Option<String>,
    district: Option<String>,
    target: Option<GeometryRef>,
    seq: u64,
}

impl TransitionKey {
    fn of(state: &ViewState) -> Self {
        Self {
            level: state.level,
            state: state.selected_state.clone(),
            district: state.selected_district.clone(),
            target: state.zoom_target.clone(),
            seq: state.transition_seq,
        }
    }
}

/// Everything the render surface needs for one paint.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub frame: u64,
    pub level: Level,
    pub label: String,
    /// Value of the map group's SVG `transform` attribute.
    pub transform_attr: String,
    pub states: Vec<MountedShape>,
    pub districts: Vec<MountedShape>,
    pub tooltip: Tooltip,
}

/// The map container: owns the view store, camera, culler and shape layers,
/// and keeps them in step after every input.
///
/// Time only moves through [`MapWidget::advance_frame`], so a sequence of
/// inputs always produces the same frames.
pub struct MapWidget {
    config: ViewerConfig,
    atlas: RegionAtlas,
    store: ViewStore,
    camera: Camera,
    controller: TransitionController,
    scope: GracefulExit,
    states: ShapeLayer,
    districts: ShapeLayer,
    tooltip: Tooltip,
    transform_attr: SvgTransformAttr,
    frame: Frame,
    bus: EventBus,
    last_key: Option<TransitionKey>,
}

impl std::fmt::Debug for MapWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapWidget")
            .field("frame", &self.frame)
            .field("state", self.store.state())
            .field("camera", &self.camera)
            .field("scope", &self.scope.scope())
            .finish_non_exhaustive()
    }
}

impl MapWidget {
    pub fn mount(
        atlas: RegionAtlas,
        session: Box<dyn SessionStore>,
        config: ViewerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let frame = Frame::new(0, config.frame_ms);
        let store = ViewStore::mount(session, StoreSettings::from(&config), frame);
        let controller =
            TransitionController::new(&config, atlas.canvas(), store.state().transition_seq);

        let mut widget = Self {
            camera: Camera::new(config.transition_ms),
            controller,
            scope: GracefulExit::new(config.exit_delay_ms),
            states: ShapeLayer::new(LayerId::STATES, ShapeStyle::states()),
            districts: ShapeLayer::new(LayerId::DISTRICTS, ShapeStyle::districts()),
            tooltip: Tooltip::new(),
            transform_attr: SvgTransformAttr(ViewTransform::IDENTITY.to_svg_attr()),
            frame,
            bus: EventBus::new(),
            last_key: None,
            config,
            atlas,
            store,
        };
        widget.sync();
        Ok(widget)
    }

    pub fn state(&self) -> &ViewState {
        self.store.state()
    }

    /// Forwards to [`ViewStore::subscribe`].
    pub fn subscribe(&mut self, listener: impl FnMut(&ViewState) + 'static) -> ListenerId {
        self.store.subscribe(listener)
    }

    pub fn atlas(&self) -> &RegionAtlas {
        &self.atlas
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controller(&self) -> &TransitionController {
        &self.controller
    }

    pub fn scope(&self) -> &GracefulExit {
        &self.scope
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn visible_districts(&self) -> Vec<&str> {
        self.districts
            .shapes()
            .iter()
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn click_state(&mut self, name: &str) {
        let Some(region) = self.atlas.state(name) else {
            debug!(name, "click on unknown state ignored");
            return;
        };
        let (id, geometry) = (region.name.clone(), region.geometry_ref());
        let result = self.store.select_state(id.clone(), geometry);
        self.after_selection(&id, result);
    }

    pub fn click_district(&mut self, name: &str) {
        let Some(region) = self.atlas.district(name) else {
            debug!(name, "click on unknown district ignored");
            return;
        };
        let state = self.store.state();
        if state.level == Level::State && region.parent != state.selected_state {
            debug!(name, parent = ?region.parent, "click on district outside selected state ignored");
            return;
        }
        let (id, geometry) = (region.name.clone(), region.geometry_ref());
        let result = self.store.select_district(id.clone(), geometry);
        self.after_selection(&id, result);
    }

    pub fn back(&mut self) {
        if self.store.go_back() {
            self.bus
                .emit(self.frame, "back", self.store.state().level.to_string());
        }
        self.sync();
    }

    pub fn reset(&mut self) {
        self.store.reset();
        self.bus.emit(self.frame, "reset", "");
        self.sync();
    }

    pub fn hover(&mut self, kind: RegionKind, name: &str, at: Vec2) {
        if !self.store.is_interactive(name) {
            return;
        }
        let (hovered, other) = match kind {
            RegionKind::State => (&mut self.states, &mut self.districts),
            RegionKind::District => (&mut self.districts, &mut self.states),
        };
        hovered.set_hover(Some(name));
        other.set_hover(None);
        self.tooltip.show(name, at);
        self.reconcile_layers();
    }

    pub fn pointer_move(&mut self, at: Vec2) {
        self.tooltip.move_to(at);
    }

    pub fn leave(&mut self) {
        self.states.set_hover(None);
        self.districts.set_hover(None);
        self.tooltip.hide();
        self.reconcile_layers();
    }

    /// Hands the explore route for the current selection to `router`.
    pub fn explore(&mut self, router: &mut dyn Router) -> Option<String> {
        let path = explore_route(
            self.store.state(),
            &self.config.route_prefix,
            &self.config.route_separator,
        )?;
        router.navigate(&path);
        self.bus.emit(self.frame, "explore", path.clone());
        Some(path)
    }

    /// Moves to the next frame: due commits and timers fire, then the camera
    /// paints its transform.
    pub fn advance_frame(&mut self) -> Frame {
        self.frame = self.frame.next();
        self.store.tick(self.frame);
        if self.scope.tick(self.frame) {
            self.bus.emit(self.frame, "scope", "exit");
        }
        self.sync();
        self.camera
            .advance(self.frame.time, &mut self.transform_attr);
        self.frame
    }

    /// Advances whole frames until at least `ms` milliseconds have passed.
    pub fn wait_ms(&mut self, ms: u64) {
        let until = self.frame.time.add_ms(ms);
        while self.frame.time < until {
            self.advance_frame();
        }
    }

    pub fn run_step(&mut self, step: &Step, router: &mut dyn Router) {
        match step {
            Step::Click {
                kind: RegionKind::State,
                name,
            } => self.click_state(name),
            Step::Click {
                kind: RegionKind::District,
                name,
            } => self.click_district(name),
            Step::Hover(name) => {
                let kind = if self.atlas.district(name).is_some() {
                    RegionKind::District
                } else {
                    RegionKind::State
                };
                let at = self.tooltip.position;
                self.hover(kind, name, at);
            }
            Step::Leave => self.leave(),
            Step::Back => self.back(),
            Step::Reset => self.reset(),
            Step::Wait(ms) => self.wait_ms(*ms),
            Step::Explore => {
                self.explore(router);
            }
        }
    }

    pub fn render(&self) -> RenderFrame {
        let state = self.store.state();
        RenderFrame {
            frame: self.frame.index,
            level: state.level,
            label: state.label.clone(),
            transform_attr: self.transform_attr.0.clone(),
            states: self.states.shapes().to_vec(),
            districts: self.districts.shapes().to_vec(),
            tooltip: self.tooltip.clone(),
        }
    }

    fn after_selection(&mut self, id: &str, result: Result<Selection, ViewError>) {
        match result {
            Ok(Selection::Scheduled) => {
                self.bus.emit(self.frame, "select", id.to_string());
            }
            Ok(Selection::Ignored) => {}
            Err(err) => warn!(region = id, error = %err, "selection rejected"),
        }
        self.sync();
    }

    fn sync(&mut self) {
        let now = self.frame.time;
        let state = self.store.state();

        let key = TransitionKey::of(state);
        if self.last_key.as_ref() != Some(&key) {
            let outcome = self
                .controller
                .observe(state, &self.atlas, &mut self.camera, now);
            match &outcome {
                TransitionOutcome::Animating { target } => {
                    self.bus.emit(self.frame, "transition", target.to_svg_attr())
                }
                TransitionOutcome::Suppressed { seq } => {
                    self.bus.emit(self.frame, "suppressed", seq.to_string())
                }
                TransitionOutcome::Unresolved { geometry } => {
                    self.bus.emit(self.frame, "unresolved", geometry.name.clone())
                }
                TransitionOutcome::Unchanged => {}
            }
            self.last_key = Some(key);
        }

        match self.scope.observe(state.selected_state.as_deref(), now) {
            ScopeChange::Entered(scope) => self.bus.emit(self.frame, "scope", scope),
            ScopeChange::ExitScheduled { at } => {
                self.bus.emit(self.frame, "scope", format!("exit at {}", at.ms()))
            }
            ScopeChange::ExitCancelled => self.bus.emit(self.frame, "scope", "exit cancelled"),
            ScopeChange::Unchanged => {}
        }

        self.reconcile_layers();
    }

    fn reconcile_layers(&mut self) {
        let state = self.store.state();
        self.states.reconcile(
            &self.atlas,
            self.atlas.states(),
            state.selected_state.as_deref(),
        );
        let districts = self.districts.reconcile(
            &self.atlas,
            self.scope.visible_districts(&self.atlas),
            state.selected_district.as_deref(),
        );
        if districts.mounted + districts.unmounted > 0 {
            debug!(
                layer = self.districts.id().0,
                mounted = districts.mounted,
                unmounted = districts.unmounted,
                total = self.districts.mounted_len(),
                "district shapes reconciled"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formats::{BoundaryCollection, PropertyKeys};
    use pretty_assertions::assert_eq;
    use scene::{Canvas, NameCorrections};
    use session::InMemorySessionStore;

    const STATES: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"Meghalaya"},
         "geometry":{"type":"Polygon","coordinates":[[[89.8,25.0],[92.8,25.0],[92.8,26.1],[89.8,26.1],[89.8,25.0]]]}},
        {"type":"Feature","properties":{"name":"Assam"},
         "geometry":{"type":"Polygon","coordinates":[[[89.7,24.1],[96.0,24.1],[96.0,28.0],[89.7,28.0],[89.7,24.1]]]}}
    ]}"#;

    const DISTRICTS: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"district":"East Khasi Hills","st_nm":"Meghalaya"},
         "geometry":{"type":"Polygon","coordinates":[[[91.6,25.1],[92.2,25.1],[92.2,25.7],[91.6,25.7],[91.6,25.1]]]}},
        {"type":"Feature","properties":{"district":"Kamrup","st_nm":"Assam"},
         "geometry":{"type":"Polygon","coordinates":[[[91.0,25.9],[91.9,25.9],[91.9,26.5],[91.0,26.5],[91.0,25.9]]]}}
    ]}"#;

    fn widget() -> MapWidget {
        let keys = PropertyKeys::default();
        let atlas = RegionAtlas::build(
            BoundaryCollection::from_geojson_str(STATES, &keys).unwrap(),
            BoundaryCollection::from_geojson_str(DISTRICTS, &keys).unwrap(),
            NameCorrections::default(),
            Canvas::default(),
        )
        .unwrap();
        MapWidget::mount(
            atlas,
            Box::new(InMemorySessionStore::new()),
            ViewerConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn zoom_target_moves_camera_before_level_commits() {
        let mut w = widget();
        w.click_state("Meghalaya");
        assert_eq!(w.state().level, Level::Default);
        assert!(w.camera().is_animating());
        assert!(w.visible_districts().is_empty());

        w.advance_frame();
        assert_eq!(w.state().level, Level::State);
        assert_eq!(w.visible_districts(), vec!["East Khasi Hills"]);
        assert_eq!(w.controller().animations_started(), 1);
    }

    #[test]
    fn unknown_and_foreign_districts_are_ignored() {
        let mut w = widget();
        w.click_state("Atlantis");
        assert_eq!(w.state().zoom_target, None);

        w.click_state("Meghalaya");
        w.advance_frame();
        w.click_district("Kamrup");
        w.advance_frame();
        assert_eq!(w.state().level, Level::State);
        assert_eq!(w.state().selected_district, None);
    }

    #[test]
    fn district_click_at_default_level_is_rejected() {
        let mut w = widget();
        w.click_district("East Khasi Hills");
        w.advance_frame();
        assert_eq!(w.state().level, Level::Default);
        assert_eq!(w.state().zoom_target, None);
    }

    #[test]
    fn hover_shows_tooltip_and_highlights() {
        let mut w = widget();
        w.hover(RegionKind::State, "Assam", Vec2::new(10.0, 20.0));
        w.pointer_move(Vec2::new(12.0, 22.0));
        let frame = w.render();
        assert!(frame.tooltip.visible);
        assert_eq!(frame.tooltip.content, "Assam");
        assert_eq!(frame.tooltip.position, Vec2::new(12.0, 22.0));
        let assam = frame.states.iter().find(|s| s.name == "Assam").unwrap();
        assert!(assam.hovered);

        w.leave();
        let frame = w.render();
        assert!(!frame.tooltip.visible);
        assert!(frame.states.iter().all(|s| !s.hovered));
    }

    #[test]
    fn non_interactive_region_gets_no_hover() {
        let mut w = widget();
        w.hover(RegionKind::State, "Bangladesh", Vec2::new(1.0, 1.0));
        assert!(!w.render().tooltip.visible);
    }

    #[test]
    fn explore_routes_deepest_selection() {
        let mut w = widget();
        let mut router: Vec<String> = Vec::new();
        assert_eq!(w.explore(&mut router), None);

        w.click_state("Meghalaya");
        w.advance_frame();
        w.click_district("East Khasi Hills");
        w.advance_frame();
        w.explore(&mut router);
        assert_eq!(router, vec!["/explore/meghalaya/east-khasi-hills".to_string()]);
    }

    #[test]
    fn camera_settles_on_state_frame() {
        let mut w = widget();
        w.click_state("Meghalaya");
        w.wait_ms(800);
        assert!(!w.camera().is_animating());
        let frame = w.render();
        assert_eq!(frame.transform_attr, w.camera().current().to_svg_attr());
        assert_ne!(frame.transform_attr, ViewTransform::IDENTITY.to_svg_attr());
    }
}
