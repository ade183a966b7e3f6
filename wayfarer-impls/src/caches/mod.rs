mod file_cache;
mod memory_cache;

pub use file_cache::*;
pub use memory_cache::*;
