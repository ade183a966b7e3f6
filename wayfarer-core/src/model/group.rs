use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{GroupId, ValidationError};

/// The longest trip a group can plan, counting both ends
pub const MAX_TRIP_DAYS: i64 = 90;

/// A group of travelers planning one shared trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    /// Where the group travels from. Determines the currency of budget questions.
    pub origin: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// How many members are expected to take part
    pub group_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    pub origin: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub group_size: u32,
}

/// The fields of a group any member may change after creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub group_size: Option<u32>,
}

impl NewGroup {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(self.start_date, self.end_date, self.group_size)
    }
}

impl Group {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(self.start_date, self.end_date, self.group_size)
    }

    /// Returns the number of days the trip spans, counting both ends.
    pub fn day_count(&self) -> u32 {
        (self.end_date - self.start_date).num_days().unsigned_abs() as u32 + 1
    }

    /// Returns true if applying the update would move the trip somewhere else.
    pub fn destination_changes(&self, update: &GroupUpdate) -> bool {
        update
            .destination
            .as_deref()
            .is_some_and(|d| !same_place(d, &self.destination))
    }

    /// Returns a copy of the group with the update applied, rejecting invalid results.
    pub fn apply(&self, update: &GroupUpdate) -> Result<Group, ValidationError> {
        let updated = Group {
            id: self.id,
            name: update.name.clone().unwrap_or_else(|| self.name.clone()),
            origin: self.origin.clone(),
            destination: update
                .destination
                .clone()
                .unwrap_or_else(|| self.destination.clone()),
            start_date: update.start_date.unwrap_or(self.start_date),
            end_date: update.end_date.unwrap_or(self.end_date),
            group_size: update.group_size.unwrap_or(self.group_size),
        };

        updated.validate()?;
        Ok(updated)
    }
}

fn validate_fields(
    start: NaiveDate,
    end: NaiveDate,
    group_size: u32,
) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::InvalidDateRange { start, end });
    }

    let days = (end - start).num_days() + 1;

    if days > MAX_TRIP_DAYS {
        return Err(ValidationError::TripTooLong {
            days,
            max: MAX_TRIP_DAYS,
        });
    }

    if group_size == 0 {
        return Err(ValidationError::InvalidGroupSize);
    }

    Ok(())
}

fn same_place(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use super::{Group, GroupUpdate, NewGroup, MAX_TRIP_DAYS};
    use crate::ValidationError;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn group() -> Group {
        Group {
            id: 1,
            name: "Summer".to_string(),
            origin: "Oslo, Norway".to_string(),
            destination: "Lisbon".to_string(),
            start_date: date(1),
            end_date: date(4),
            group_size: 3,
        }
    }

    #[test]
    fn day_count_is_inclusive() {
        assert_eq!(group().day_count(), 4);

        let single = Group {
            end_date: date(1),
            ..group()
        };
        assert_eq!(single.day_count(), 1);
    }

    #[test]
    fn rejects_reversed_dates() {
        let update = GroupUpdate {
            start_date: Some(date(10)),
            ..Default::default()
        };

        assert_eq!(
            group().apply(&update),
            Err(ValidationError::InvalidDateRange {
                start: date(10),
                end: date(4)
            })
        );
    }

    #[test]
    fn rejects_trips_longer_than_the_limit() {
        let new_group = NewGroup {
            name: "Gap year".to_string(),
            origin: "Oslo, Norway".to_string(),
            destination: "Lisbon".to_string(),
            start_date: date(1),
            end_date: NaiveDate::from_ymd_opt(2028, 2, 26).unwrap(),
            group_size: 2,
        };

        assert!(matches!(
            new_group.validate(),
            Err(ValidationError::TripTooLong { max: MAX_TRIP_DAYS, .. })
        ));

        let longest = date(1) + chrono::Duration::days(MAX_TRIP_DAYS - 1);
        let update = GroupUpdate {
            end_date: Some(longest),
            ..Default::default()
        };
        assert_eq!(group().apply(&update).unwrap().day_count(), 90);

        let update = GroupUpdate {
            end_date: Some(longest + chrono::Duration::days(1)),
            ..Default::default()
        };
        assert_eq!(
            group().apply(&update),
            Err(ValidationError::TripTooLong {
                days: 91,
                max: MAX_TRIP_DAYS
            })
        );
    }

    #[test]
    fn destination_change_ignores_case_and_whitespace() {
        let same = GroupUpdate {
            destination: Some("  lisbon ".to_string()),
            ..Default::default()
        };
        let other = GroupUpdate {
            destination: Some("Porto".to_string()),
            ..Default::default()
        };

        assert!(!group().destination_changes(&same));
        assert!(group().destination_changes(&other));
        assert!(!group().destination_changes(&GroupUpdate::default()));
    }
}
