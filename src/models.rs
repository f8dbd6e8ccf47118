use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub const fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    /// Exact match against the enumerated labels.
    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|gender| gender.as_str() == value)
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeBucket {
    EighteenToTwenty,
    TwentyOneToTwentyThree,
    TwentyFourPlus,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 3] = [
        AgeBucket::EighteenToTwenty,
        AgeBucket::TwentyOneToTwentyThree,
        AgeBucket::TwentyFourPlus,
    ];

    /// Buckets a raw age. Ages under 18 land in the `24+` catch-all.
    pub const fn from_age(age: u32) -> Self {
        match age {
            18..=20 => AgeBucket::EighteenToTwenty,
            21..=23 => AgeBucket::TwentyOneToTwentyThree,
            _ => AgeBucket::TwentyFourPlus,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            AgeBucket::EighteenToTwenty => "18–20",
            AgeBucket::TwentyOneToTwentyThree => "21–23",
            AgeBucket::TwentyFourPlus => "24+",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.as_str() == value)
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric columns of the fact table that reports can average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Measure {
    SleepDuration,
    StressLevel,
    MentalHealthScore,
    AddictedScore,
    Phq9Score,
    Cgpa,
    AcademicPressure,
    SleepHoursX,
    WorkStudyHours,
}

/// One student-summary row as delivered by a fact source.
#[derive(Debug, Clone, PartialEq)]
pub struct FactRecord {
    pub gender: Gender,
    pub age: u32,
    pub sleep_duration: Option<f64>,
    pub stress_level: Option<f64>,
    pub mental_health_score: Option<f64>,
    pub addicted_score: Option<f64>,
    pub phq9_score: Option<f64>,
    pub cgpa: Option<f64>,
    pub academic_pressure: Option<f64>,
    pub sleep_hours_x: Option<f64>,
    pub work_study_hours: Option<f64>,
}

impl FactRecord {
    pub fn new(gender: Gender, age: u32) -> Self {
        Self {
            gender,
            age,
            sleep_duration: None,
            stress_level: None,
            mental_health_score: None,
            addicted_score: None,
            phq9_score: None,
            cgpa: None,
            academic_pressure: None,
            sleep_hours_x: None,
            work_study_hours: None,
        }
    }

    pub fn age_bucket(&self) -> AgeBucket {
        AgeBucket::from_age(self.age)
    }

    pub fn measure(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::SleepDuration => self.sleep_duration,
            Measure::StressLevel => self.stress_level,
            Measure::MentalHealthScore => self.mental_health_score,
            Measure::AddictedScore => self.addicted_score,
            Measure::Phq9Score => self.phq9_score,
            Measure::Cgpa => self.cgpa,
            Measure::AcademicPressure => self.academic_pressure,
            Measure::SleepHoursX => self.sleep_hours_x,
            Measure::WorkStudyHours => self.work_study_hours,
        }
    }

    pub fn with_measure(mut self, measure: Measure, value: Option<f64>) -> Self {
        let slot = match measure {
            Measure::SleepDuration => &mut self.sleep_duration,
            Measure::StressLevel => &mut self.stress_level,
            Measure::MentalHealthScore => &mut self.mental_health_score,
            Measure::AddictedScore => &mut self.addicted_score,
            Measure::Phq9Score => &mut self.phq9_score,
            Measure::Cgpa => &mut self.cgpa,
            Measure::AcademicPressure => &mut self.academic_pressure,
            Measure::SleepHoursX => &mut self.sleep_hours_x,
            Measure::WorkStudyHours => &mut self.work_study_hours,
        };
        *slot = value;
        self
    }
}

/// Raw filter values as received from a caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub gender: String,
    pub age_range: String,
}

impl FilterSelection {
    pub const ALL: &'static str = "All";

    pub fn new(gender: impl Into<String>, age_range: impl Into<String>) -> Self {
        Self {
            gender: gender.into(),
            age_range: age_range.into(),
        }
    }
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self::new(Self::ALL, Self::ALL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Gender,
    AgeBucket,
}

/// A group label on one dimension; `All` marks a rolled-up dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Gender(Gender),
    Age(AgeBucket),
    All,
}

impl Label {
    pub fn of(record: &FactRecord, dimension: Dimension) -> Self {
        match dimension {
            Dimension::Gender => Label::Gender(record.gender),
            Dimension::AgeBucket => Label::Age(record.age_bucket()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupAggregate {
    pub labels: BTreeMap<Dimension, Label>,
    pub values: BTreeMap<Measure, Option<f64>>,
}

impl GroupAggregate {
    pub fn label(&self, dimension: Dimension) -> Option<Label> {
        self.labels.get(&dimension).copied()
    }

    pub fn value(&self, measure: Measure) -> Option<f64> {
        self.values.get(&measure).copied().flatten()
    }

    pub fn is_rollup(&self) -> bool {
        self.labels.values().any(|label| *label == Label::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bucket_boundaries_follow_table() {
        assert_eq!(AgeBucket::from_age(17), AgeBucket::TwentyFourPlus);
        assert_eq!(AgeBucket::from_age(18), AgeBucket::EighteenToTwenty);
        assert_eq!(AgeBucket::from_age(20), AgeBucket::EighteenToTwenty);
        assert_eq!(AgeBucket::from_age(21), AgeBucket::TwentyOneToTwentyThree);
        assert_eq!(AgeBucket::from_age(23), AgeBucket::TwentyOneToTwentyThree);
        assert_eq!(AgeBucket::from_age(24), AgeBucket::TwentyFourPlus);
        assert_eq!(AgeBucket::from_age(0), AgeBucket::TwentyFourPlus);
    }

    #[test]
    fn labels_parse_exactly() {
        assert_eq!(Gender::from_label("Female"), Some(Gender::Female));
        assert_eq!(Gender::from_label("female"), None);
        assert_eq!(AgeBucket::from_label("21–23"), Some(AgeBucket::TwentyOneToTwentyThree));
        assert_eq!(AgeBucket::from_label("21-23"), None);
        assert_eq!(AgeBucket::from_label("All"), None);
    }

    #[test]
    fn with_measure_sets_only_that_column() {
        let record = FactRecord::new(Gender::Male, 19).with_measure(Measure::Cgpa, Some(3.2));
        assert_eq!(record.measure(Measure::Cgpa), Some(3.2));
        assert_eq!(record.measure(Measure::StressLevel), None);
    }

    proptest! {
        #[test]
        fn every_age_has_one_bucket(age in any::<u32>()) {
            let bucket = AgeBucket::from_age(age);
            prop_assert!(AgeBucket::ALL.contains(&bucket));
            let expected = match age {
                18..=20 => "18–20",
                21..=23 => "21–23",
                _ => "24+",
            };
            prop_assert_eq!(bucket.as_str(), expected);
        }
    }
}
