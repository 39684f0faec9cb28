pub mod loader;
pub mod script;
pub mod widget;

pub use loader::*;
pub use script::*;
pub use widget::*;
