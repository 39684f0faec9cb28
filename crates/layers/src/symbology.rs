/// Fill colours of one shape layer, as CSS colour strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeStyle {
    pub fill: String,
    pub hover_fill: String,
    pub selected_fill: String,
}

impl ShapeStyle {
    pub fn new(
        fill: impl Into<String>,
        hover_fill: impl Into<String>,
        selected_fill: impl Into<String>,
    ) -> Self {
        Self {
            fill: fill.into(),
            hover_fill: hover_fill.into(),
            selected_fill: selected_fill.into(),
        }
    }

    pub fn states() -> Self {
        Self::new("#d8e8d0", "#a9cf9a", "#5f9e4f")
    }

    pub fn districts() -> Self {
        Self::new("#f3e3c3", "#e8c98b", "#c98f2e")
    }

    /// Selection wins over hover.
    pub fn fill_for(&self, selected: bool, hovered: bool) -> &str {
        if selected {
            &self.selected_fill
        } else if hovered {
            &self.hover_fill
        } else {
            &self.fill
        }
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self::states()
    }
}
