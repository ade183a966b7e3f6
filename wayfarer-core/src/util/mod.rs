mod cache;
mod clock;

pub use cache::*;
pub use clock::*;
