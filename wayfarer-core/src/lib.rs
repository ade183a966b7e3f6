//! The consolidation engine behind a group trip planner.
//!
//! Members answer per-category questions, vote on the suggestions those answers
//! produce, and the engines in this crate turn those independent inputs into a
//! single consensus per category and a day-by-day itinerary.
//!
//! Nothing in here performs I/O directly. Persistence and the durable client
//! cache are reached through [ClientCache] and the `wayfarer-collab` crate.

mod config;
mod error;
mod model;
mod session;
mod util;

pub mod answers;
pub mod catalog;
pub mod completion;
pub mod itinerary;
pub mod voting;

pub use config::*;
pub use error::*;
pub use model::*;
pub use session::*;
pub use util::*;
