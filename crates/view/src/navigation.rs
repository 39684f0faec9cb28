use crate::store::{Level, ViewState};

/// External router that owns URL navigation.
pub trait Router {
    fn navigate(&mut self, path: &str);
}

/// Router that just records the paths it was handed.
impl Router for Vec<String> {
    fn navigate(&mut self, path: &str) {
        self.push(path.to_string());
    }
}

/// Lowercases `name` and joins its words with `separator`.
pub fn route_segment(name: &str, separator: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Path for the "explore" action, or `None` when nothing is selected.
pub fn explore_route(state: &ViewState, prefix: &str, separator: &str) -> Option<String> {
    let prefix = prefix.trim_end_matches('/');
    let selected_state = state.selected_state.as_deref()?;
    match state.level {
        Level::Default => None,
        Level::State => Some(format!(
            "{prefix}/{}",
            route_segment(selected_state, separator)
        )),
        Level::District => {
            let district = state.selected_district.as_deref()?;
            Some(format!(
                "{prefix}/{}/{}",
                route_segment(selected_state, separator),
                route_segment(district, separator)
            ))
        }
    }
}
