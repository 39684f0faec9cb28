pub mod camera;
pub mod config;
pub mod navigation;
pub mod store;
pub mod tooltip;
pub mod transition;

pub use camera::*;
pub use config::*;
pub use navigation::*;
pub use store::*;
pub use tooltip::*;
pub use transition::*;
