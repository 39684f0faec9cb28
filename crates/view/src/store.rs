use runtime::{Frame, Scheduler};
use scene::GeometryRef;
use serde::{Deserialize, Serialize};
use session::SessionStore;
use tracing::{debug, warn};

use crate::config::ViewerConfig;

/// Drill-down depth of the map.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Default,
    State,
    District,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Default => write!(f, "default"),
            Level::State => write!(f, "state"),
            Level::District => write!(f, "district"),
        }
    }
}

/// The map's view state. Serialized as-is into session storage.
///
/// Only [`ViewStore`] mutates it; everyone else gets `&ViewState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub level: Level,
    pub selected_state: Option<String>,
    pub selected_district: Option<String>,
    pub label: String,
    /// What the camera should frame next; `None` means the full extent.
    pub zoom_target: Option<GeometryRef>,
    pub transition_seq: u64,
    /// Last selected state, kept while a district is selected.
    pub retained_parent: Option<GeometryRef>,
}

impl ViewState {
    pub fn initial(default_label: impl Into<String>) -> Self {
        Self {
            level: Level::Default,
            selected_state: None,
            selected_district: None,
            label: default_label.into(),
            zoom_target: None,
            transition_seq: 0,
            retained_parent: None,
        }
    }

    /// `district => state selected` and `default => nothing selected`.
    pub fn is_consistent(&self) -> bool {
        match self.level {
            Level::Default => self.selected_state.is_none() && self.selected_district.is_none(),
            Level::State => self.selected_state.is_some() && self.selected_district.is_none(),
            Level::District => self.selected_state.is_some() && self.selected_district.is_some(),
        }
    }

    /// Points `zoom_target` back at the committed selection.
    ///
    /// A snapshot persisted between the two phases of a selection carries a
    /// target one level ahead of `level`; nothing would ever commit it.
    fn settle_zoom_target(&mut self) {
        match self.level {
            Level::Default => {
                self.zoom_target = None;
                self.retained_parent = None;
            }
            Level::State => {
                self.zoom_target = self
                    .retained_parent
                    .clone()
                    .or_else(|| self.selected_state.clone().map(GeometryRef::state));
            }
            Level::District => {
                self.zoom_target = self.selected_district.clone().map(GeometryRef::district);
            }
        }
    }
}

/// Result of a selection request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Zoom target set now; level and selection commit on the next frame.
    Scheduled,
    /// The region is non-interactive.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// District selection requires the state level to be committed.
    DistrictOutsideState { level: Level },
    /// A different state is about to be committed.
    StateCommitPending { state: String },
}

impl std::fmt::Display for ViewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewError::DistrictOutsideState { level } => {
                write!(f, "district selection requires state level, current level is {level}")
            }
            ViewError::StateCommitPending { state } => {
                write!(f, "district selection while state {state} is still being committed")
            }
        }
    }
}

impl std::error::Error for ViewError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&ViewState)>;

/// Second phase of a selection, applied one frame after the zoom target.
#[derive(Debug, Clone, PartialEq)]
enum Commit {
    State { id: String, geometry: GeometryRef },
    District { id: String },
}

/// Settings the store needs from [`ViewerConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub default_label: String,
    pub non_interactive: Vec<String>,
    pub session_key: String,
}

impl From<&ViewerConfig> for StoreSettings {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            default_label: config.default_label.clone(),
            non_interactive: config.non_interactive.clone(),
            session_key: config.session_key.clone(),
        }
    }
}

/// Single source of truth for drill-down level and selection.
///
/// Mutation goes through `select_state`, `select_district`, `go_back` and
/// `reset`. Selections are two-phase: the zoom target is set synchronously so
/// the camera can start moving, and the level/selection commit is deferred to
/// the next [`ViewStore::tick`]. Every change is persisted to the session store
/// and pushed to subscribers.
pub struct ViewStore {
    state: ViewState,
    settings: StoreSettings,
    session: Box<dyn SessionStore>,
    commits: Scheduler<Commit>,
    /// State id of the latest scheduled, not yet applied, state commit.
    pending_state: Option<String>,
    frame: Frame,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl std::fmt::Debug for ViewStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewStore")
            .field("state", &self.state)
            .field("pending_commits", &self.commits.len())
            .field("pending_state", &self.pending_state)
            .field("frame", &self.frame)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ViewStore {
    /// Creates the store, rehydrating from `session` when a valid snapshot exists.
    ///
    /// A restored snapshot gets `transition_seq + 1` so the transition
    /// controller re-runs against the restored zoom target. The target is
    /// realigned with the restored level first.
    pub fn mount(session: Box<dyn SessionStore>, settings: StoreSettings, frame: Frame) -> Self {
        let state = match session::load_json::<ViewState>(&*session, &settings.session_key)
        {
            Ok(Some(mut restored)) if restored.is_consistent() => {
                restored.settle_zoom_target();
                restored.transition_seq = restored.transition_seq.saturating_add(1);
                debug!(
                    level = %restored.level,
                    seq = restored.transition_seq,
                    "view state rehydrated from session"
                );
                restored
            }
            Ok(Some(restored)) => {
                warn!(level = %restored.level, "discarding inconsistent session snapshot");
                ViewState::initial(settings.default_label.clone())
            }
            Ok(None) => ViewState::initial(settings.default_label.clone()),
            Err(err) => {
                warn!(error = %err, "session snapshot unreadable; starting fresh");
                ViewState::initial(settings.default_label.clone())
            }
        };

        Self {
            state,
            settings,
            session,
            commits: Scheduler::new(),
            pending_state: None,
            frame,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn pending_commits(&self) -> usize {
        self.commits.len()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ViewState) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    pub fn is_interactive(&self, region: &str) -> bool {
        !self.settings.non_interactive.iter().any(|r| r == region)
    }

    pub fn select_state(
        &mut self,
        id: impl Into<String>,
        geometry: GeometryRef,
    ) -> Result<Selection, ViewError> {
        let id = id.into();
        if !self.is_interactive(&id) {
            debug!(region = %id, "ignoring selection of non-interactive region");
            return Ok(Selection::Ignored);
        }

        self.retarget(geometry.clone());
        self.pending_state = Some(id.clone());
        self.commits
            .defer(self.frame, Commit::State { id, geometry });
        Ok(Selection::Scheduled)
    }

    pub fn select_district(
        &mut self,
        id: impl Into<String>,
        geometry: GeometryRef,
    ) -> Result<Selection, ViewError> {
        if self.state.level != Level::State {
            return Err(ViewError::DistrictOutsideState {
                level: self.state.level,
            });
        }
        if let Some(state) = &self.pending_state {
            return Err(ViewError::StateCommitPending {
                state: state.clone(),
            });
        }
        let id = id.into();
        if !self.is_interactive(&id) {
            debug!(region = %id, "ignoring selection of non-interactive region");
            return Ok(Selection::Ignored);
        }

        self.retarget(geometry);
        self.commits.defer(self.frame, Commit::District { id });
        Ok(Selection::Scheduled)
    }

    /// One level up. Returns `false` at the default level.
    pub fn go_back(&mut self) -> bool {
        let s = &mut self.state;
        match s.level {
            Level::Default => return false,
            Level::District => {
                s.level = Level::State;
                s.selected_district = None;
                s.zoom_target = s.retained_parent.clone();
                s.label = s
                    .selected_state
                    .clone()
                    .unwrap_or_else(|| self.settings.default_label.clone());
            }
            Level::State => {
                s.level = Level::Default;
                s.selected_state = None;
                s.selected_district = None;
                s.zoom_target = None;
                s.retained_parent = None;
                s.label = self.settings.default_label.clone();
            }
        }
        s.transition_seq += 1;

        let dropped = self.commits.cancel_all();
        self.pending_state = None;
        if dropped > 0 {
            debug!(dropped, "go_back superseded pending selection commits");
        }
        debug!(level = %self.state.level, seq = self.state.transition_seq, "went back");
        self.changed();
        true
    }

    /// Unconditionally returns to the default level and clears the session entry.
    pub fn reset(&mut self) {
        self.commits.cancel_all();
        self.pending_state = None;
        let seq = self.state.transition_seq + 1;
        self.state = ViewState::initial(self.settings.default_label.clone());
        self.state.transition_seq = seq;

        if let Err(err) = self.session.remove(&self.settings.session_key) {
            warn!(error = %err, "failed to clear session snapshot");
        }
        self.notify();
    }

    /// Applies selection commits that became due at `frame`.
    ///
    /// Returns `true` if the state changed.
    pub fn tick(&mut self, frame: Frame) -> bool {
        self.frame = frame;
        let due = self.commits.advance(frame);
        if due.is_empty() {
            return false;
        }
        for commit in due {
            self.apply(commit);
        }
        if self.commits.is_empty() {
            self.pending_state = None;
        }
        self.changed();
        true
    }

    fn retarget(&mut self, geometry: GeometryRef) {
        if self.state.zoom_target.as_ref() == Some(&geometry) {
            return;
        }
        self.state.zoom_target = Some(geometry);
        self.changed();
    }

    fn apply(&mut self, commit: Commit) {
        let s = &mut self.state;
        s.transition_seq += 1;
        match commit {
            Commit::State { id, geometry } => {
                s.level = Level::State;
                s.label = id.clone();
                s.selected_state = Some(id);
                s.selected_district = None;
                s.retained_parent = Some(geometry);
            }
            Commit::District { id } => {
                s.level = Level::District;
                s.label = id.clone();
                s.selected_district = Some(id);
            }
        }
        debug!(level = %s.level, label = %s.label, seq = s.transition_seq, "selection committed");
    }

    fn changed(&mut self) {
        self.persist();
        self.notify();
    }

    fn persist(&mut self) {
        if let Err(err) =
            session::save_json(&mut *self.session, &self.settings.session_key, &self.state)
        {
            warn!(error = %err, "failed to persist view state");
        }
    }

    fn notify(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }
}
