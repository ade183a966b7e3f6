mod answer;
mod group;
mod question;
mod room;
mod suggestion;
mod vote;

pub use answer::*;
pub use group::*;
pub use question::*;
pub use room::*;
pub use suggestion::*;
pub use vote::*;

/// The type used for identifiers of persisted records.
pub type PrimaryKey = i32;

pub type GroupId = PrimaryKey;
pub type RoomId = PrimaryKey;
pub type QuestionId = PrimaryKey;
pub type SuggestionId = PrimaryKey;
pub type MemberId = PrimaryKey;
