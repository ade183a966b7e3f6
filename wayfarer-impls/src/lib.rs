mod caches;

pub use caches::*;
