//! Tracks which members are done with a room.

use serde::Serialize;

use crate::{CoreResult, MemberId, Room, RoomStatus, Session};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionStatus {
    /// Members who marked the room as done, ascending
    pub completed_by: Vec<MemberId>,
    pub is_complete: bool,
}

impl Room {
    /// Records that the acting member is done with this room.
    ///
    /// Completion can't be taken back. Returns false if the member was already recorded.
    pub fn mark_complete(&mut self, session: &Session) -> CoreResult<bool> {
        let member_id = session.member_id()?;

        Ok(self.completed_by.insert(member_id))
    }

    pub fn completion(&self, group_size: u32) -> CompletionStatus {
        CompletionStatus {
            completed_by: self.completed_by.iter().copied().collect(),
            is_complete: self.completed_by.len() >= group_size as usize,
        }
    }

    /// Moves a locked room to completed once every member is done.
    /// Returns true if the status changed.
    pub fn settle_completion(&mut self, group_size: u32) -> bool {
        let ready = self.status == RoomStatus::Locked && self.completion(group_size).is_complete;

        if ready {
            self.status = RoomStatus::Completed;
        }

        ready
    }
}

#[cfg(test)]
mod test {
    use crate::{Category, CoreError, Room, RoomStatus, Session};

    #[test]
    fn completion_is_monotonic() {
        let mut room = Room::new(1, 1, Category::Dining);
        let group_size = 2;

        assert!(room.mark_complete(&Session::new(5)).unwrap());
        assert!(!room.completion(group_size).is_complete);

        assert!(!room.mark_complete(&Session::new(5)).unwrap());
        assert_eq!(room.completion(group_size).completed_by, vec![5]);

        room.mark_complete(&Session::new(3)).unwrap();
        let status = room.completion(group_size);
        assert_eq!(status.completed_by, vec![3, 5]);
        assert!(status.is_complete);

        room.reset();
        room.mark_complete(&Session::new(3)).unwrap();
        assert!(room.completion(group_size).is_complete);
    }

    #[test]
    fn anonymous_members_cannot_complete() {
        let mut room = Room::new(1, 1, Category::Dining);

        assert_eq!(
            room.mark_complete(&Session::anonymous()),
            Err(CoreError::Unauthenticated)
        );
        assert!(room.completed_by.is_empty());
    }

    #[test]
    fn only_locked_rooms_settle() {
        let mut room = Room::new(1, 1, Category::Dining);
        room.mark_complete(&Session::new(1)).unwrap();

        assert!(!room.settle_completion(1));
        assert_eq!(room.status, RoomStatus::Active);

        room.status = RoomStatus::Locked;
        assert!(room.settle_completion(1));
        assert_eq!(room.status, RoomStatus::Completed);
        assert!(!room.settle_completion(1));
    }
}
