use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{MemberId, QuestionId};

/// Tracks which questions members are actively editing.
///
/// A lease is taken on the first interaction, renewed by every following one,
/// and lapses once `quiescence` passes without interaction.
#[derive(Debug)]
pub struct EditLeases {
    quiescence: chrono::Duration,
    last_touched: HashMap<(MemberId, QuestionId), DateTime<Utc>>,
}

impl EditLeases {
    pub fn new(quiescence: chrono::Duration) -> Self {
        Self {
            quiescence,
            last_touched: HashMap::new(),
        }
    }

    /// Acquires or renews the lease.
    pub fn touch(&mut self, member_id: MemberId, question_id: QuestionId, now: DateTime<Utc>) {
        self.last_touched.insert((member_id, question_id), now);
    }

    pub fn is_held(&self, member_id: MemberId, question_id: QuestionId, now: DateTime<Utc>) -> bool {
        self.last_touched
            .get(&(member_id, question_id))
            .is_some_and(|touched| now - *touched < self.quiescence)
    }

    pub fn release(&mut self, member_id: MemberId, question_id: QuestionId) {
        self.last_touched.remove(&(member_id, question_id));
    }

    /// Forgets leases that have lapsed.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let quiescence = self.quiescence;
        self.last_touched
            .retain(|_, touched| now - *touched < quiescence);
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Utc};

    use super::EditLeases;

    #[test]
    fn lapses_after_quiescence() {
        let mut leases = EditLeases::new(Duration::milliseconds(100));
        let start = Utc::now();

        leases.touch(1, 10, start);

        assert!(leases.is_held(1, 10, start + Duration::milliseconds(99)));
        assert!(!leases.is_held(1, 10, start + Duration::milliseconds(100)));
        assert!(!leases.is_held(2, 10, start));
    }

    #[test]
    fn renewing_extends_the_lease() {
        let mut leases = EditLeases::new(Duration::milliseconds(100));
        let start = Utc::now();

        leases.touch(1, 10, start);
        leases.touch(1, 10, start + Duration::milliseconds(80));

        assert!(leases.is_held(1, 10, start + Duration::milliseconds(150)));

        leases.prune(start + Duration::milliseconds(200));
        assert!(!leases.is_held(1, 10, start + Duration::milliseconds(150)));
    }
}
