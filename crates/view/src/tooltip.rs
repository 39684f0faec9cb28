use foundation::math::Vec2;

/// Floating hover label, independent of the view state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tooltip {
    pub content: String,
    pub visible: bool,
    /// Last pointer position, in page pixels.
    pub position: Vec2,
}

impl Tooltip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, content: impl Into<String>, at: Vec2) {
        self.content = content.into();
        self.visible = true;
        self.position = at;
    }

    /// Tracks the pointer; the consumer repositions even while hidden so the
    /// next `show` does not flash at a stale spot.
    pub fn move_to(&mut self, at: Vec2) {
        self.position = at;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}
