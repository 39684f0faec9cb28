pub mod culler;
pub mod layer;
pub mod shapes;
pub mod symbology;

pub use culler::*;
pub use layer::*;
pub use shapes::*;
pub use symbology::*;
