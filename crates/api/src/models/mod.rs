pub mod location;
pub mod node;
pub mod scope;
pub mod target;
pub mod usage;

pub use location::*;
pub use node::*;
pub use scope::*;
pub use target::*;
pub use usage::*;
