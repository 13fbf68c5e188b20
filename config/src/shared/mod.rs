mod base;
mod loader;
mod pipeline;

pub use base::*;
pub use loader::*;
pub use pipeline::*;
