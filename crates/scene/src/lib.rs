pub mod atlas;
pub mod corrections;
pub mod region;

pub use atlas::*;
pub use corrections::*;
pub use region::*;
