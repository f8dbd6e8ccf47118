use crate::error::{EngineError, FilterAxis};
use crate::models::{AgeBucket, FactRecord, FilterSelection, Gender};

/// Restriction on a single filter axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition<T> {
    MatchAll,
    Equals(T),
}

impl<T: PartialEq> Condition<T> {
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Condition::MatchAll => true,
            Condition::Equals(expected) => expected == value,
        }
    }

    pub fn selected(&self) -> Option<&T> {
        match self {
            Condition::MatchAll => None,
            Condition::Equals(value) => Some(value),
        }
    }
}

/// Validated filter selection, usable as a record predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate {
    pub gender: Condition<Gender>,
    pub age: Condition<AgeBucket>,
}

impl Predicate {
    pub const MATCH_ALL: Predicate = Predicate {
        gender: Condition::MatchAll,
        age: Condition::MatchAll,
    };

    pub fn matches(&self, record: &FactRecord) -> bool {
        self.gender.accepts(&record.gender) && self.age.accepts(&record.age_bucket())
    }

    pub fn apply<'a>(&self, records: &'a [FactRecord]) -> Vec<&'a FactRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

pub fn resolve(selection: &FilterSelection) -> Result<Predicate, EngineError> {
    let gender = resolve_axis(&selection.gender, FilterAxis::Gender, Gender::from_label)?;
    let age = resolve_axis(&selection.age_range, FilterAxis::AgeRange, AgeBucket::from_label)?;
    Ok(Predicate { gender, age })
}

fn resolve_axis<T>(
    value: &str,
    axis: FilterAxis,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Condition<T>, EngineError> {
    if value == FilterSelection::ALL {
        return Ok(Condition::MatchAll);
    }

    parse(value)
        .map(Condition::Equals)
        .ok_or_else(|| EngineError::InvalidFilterValue {
            axis,
            value: value.to_string(),
        })
}
