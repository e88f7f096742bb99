mod model;
mod progress;
mod reference;
mod store;

pub use model::*;
pub use progress::*;
pub use reference::*;
pub use store::*;
