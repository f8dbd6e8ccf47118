use clap::ValueEnum;
use tracing::debug;

use crate::filter::{Condition, Predicate};
use crate::models::{Dimension, Label, Measure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum ReportType {
    SleepStress,
    MentalHealthIndicators,
    SocialMediaImpact,
    GenderAgeComparison,
    AddictionTrend,
}

/// How a report section reacts to the age-range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeAxis {
    /// Age plays no part in grouping or rollup.
    Ignored,
    /// `All` groups by age bucket with rollup; a selected bucket pins the label.
    Grouped,
    /// `All` rolls up the base dimensions without grouping by age.
    RollupOnly,
}

/// One entry of the report configuration table.
#[derive(Debug)]
pub struct Section {
    pub name: &'static str,
    pub base_dimensions: &'static [Dimension],
    pub age_axis: AgeAxis,
    pub measures: &'static [Measure],
    /// Rows missing any of these are dropped when shaping.
    pub required: &'static [Measure],
}

static SLEEP_STRESS: [Section; 1] = [Section {
    name: "sleepStress",
    base_dimensions: &[Dimension::Gender],
    age_axis: AgeAxis::Grouped,
    measures: &[Measure::SleepDuration, Measure::StressLevel],
    required: &[Measure::SleepDuration, Measure::StressLevel],
}];

static MENTAL_HEALTH_INDICATORS: [Section; 1] = [Section {
    name: "mentalHealthIndicators",
    base_dimensions: &[],
    age_axis: AgeAxis::Ignored,
    measures: &[
        Measure::StressLevel,
        Measure::MentalHealthScore,
        Measure::AddictedScore,
        Measure::Phq9Score,
    ],
    required: &[],
}];

static SOCIAL_MEDIA_IMPACT: [Section; 1] = [Section {
    name: "socialMediaImpact",
    base_dimensions: &[],
    age_axis: AgeAxis::Grouped,
    measures: &[Measure::AddictedScore, Measure::Cgpa],
    required: &[Measure::AddictedScore, Measure::Cgpa],
}];

static GENDER_AGE_COMPARISON: [Section; 2] = [
    Section {
        name: "byGender",
        base_dimensions: &[Dimension::Gender],
        age_axis: AgeAxis::RollupOnly,
        measures: &[Measure::StressLevel, Measure::MentalHealthScore],
        required: &[Measure::StressLevel, Measure::MentalHealthScore],
    },
    Section {
        name: "byAge",
        base_dimensions: &[],
        age_axis: AgeAxis::Grouped,
        measures: &[Measure::StressLevel, Measure::MentalHealthScore],
        required: &[Measure::StressLevel, Measure::MentalHealthScore],
    },
];

static ADDICTION_TREND: [Section; 1] = [Section {
    name: "addictionTrend",
    base_dimensions: &[],
    age_axis: AgeAxis::Grouped,
    measures: &[Measure::AcademicPressure, Measure::MentalHealthScore],
    required: &[Measure::AcademicPressure, Measure::MentalHealthScore],
}];

impl ReportType {
    pub const ALL: [ReportType; 5] = [
        ReportType::SleepStress,
        ReportType::MentalHealthIndicators,
        ReportType::SocialMediaImpact,
        ReportType::GenderAgeComparison,
        ReportType::AddictionTrend,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ReportType::SleepStress => "sleep-stress",
            ReportType::MentalHealthIndicators => "mental-health-indicators",
            ReportType::SocialMediaImpact => "social-media-impact",
            ReportType::GenderAgeComparison => "gender-age-comparison",
            ReportType::AddictionTrend => "addiction-trend",
        }
    }

    /// Output sections in emission order. Only the comparison report has two.
    pub fn sections(self) -> &'static [Section] {
        match self {
            ReportType::SleepStress => &SLEEP_STRESS,
            ReportType::MentalHealthIndicators => &MENTAL_HEALTH_INDICATORS,
            ReportType::SocialMediaImpact => &SOCIAL_MEDIA_IMPACT,
            ReportType::GenderAgeComparison => &GENDER_AGE_COMPARISON,
            ReportType::AddictionTrend => &ADDICTION_TREND,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationPlan {
    /// Ordered outermost first; rollup drops dimensions from the end.
    pub group_dimensions: Vec<Dimension>,
    pub rollup: bool,
    pub measures: Vec<Measure>,
    /// Labels for dimensions the filter holds fixed instead of grouping.
    pub pinned: Vec<(Dimension, Label)>,
}

impl AggregationPlan {
    pub fn without_rollup(&self) -> Self {
        Self {
            rollup: false,
            ..self.clone()
        }
    }
}

/// Builds one plan per output section of `report`.
pub fn plan(report: ReportType, predicate: &Predicate) -> Vec<AggregationPlan> {
    report
        .sections()
        .iter()
        .map(|section| {
            let plan = plan_section(section, predicate);
            debug!(
                report = report.name(),
                section = section.name,
                dimensions = ?plan.group_dimensions,
                rollup = plan.rollup,
                "planned aggregation"
            );
            plan
        })
        .collect()
}

pub fn plan_section(section: &Section, predicate: &Predicate) -> AggregationPlan {
    let all_ages = predicate.age == Condition::MatchAll;
    let mut group_dimensions = Vec::with_capacity(section.base_dimensions.len() + 1);

    let rollup = match section.age_axis {
        AgeAxis::Ignored => false,
        AgeAxis::Grouped => {
            if all_ages {
                group_dimensions.push(Dimension::AgeBucket);
            }
            all_ages
        }
        AgeAxis::RollupOnly => all_ages,
    };
    group_dimensions.extend_from_slice(section.base_dimensions);

    let mut pinned = Vec::new();
    if !group_dimensions.contains(&Dimension::Gender) {
        let label = predicate.gender.selected().map_or(Label::All, |g| Label::Gender(*g));
        pinned.push((Dimension::Gender, label));
    }
    if !group_dimensions.contains(&Dimension::AgeBucket) {
        let label = predicate.age.selected().map_or(Label::All, |b| Label::Age(*b));
        pinned.push((Dimension::AgeBucket, label));
    }

    AggregationPlan {
        group_dimensions,
        rollup,
        measures: section.measures.to_vec(),
        pinned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::resolve;
    use crate::models::{AgeBucket, FilterSelection, Gender};

    fn predicate(gender: &str, age_range: &str) -> Predicate {
        resolve(&FilterSelection::new(gender, age_range)).unwrap()
    }

    #[test]
    fn all_ages_groups_by_bucket_with_rollup() {
        let plans = plan(ReportType::SleepStress, &predicate("All", "All"));
        assert_eq!(plans.len(), 1);
        assert_eq!(
            plans[0].group_dimensions,
            vec![Dimension::AgeBucket, Dimension::Gender]
        );
        assert!(plans[0].rollup);
        assert!(plans[0].pinned.is_empty());
    }

    #[test]
    fn selected_bucket_pins_label_without_rollup() {
        let plans = plan(ReportType::SleepStress, &predicate("All", "18–20"));
        assert_eq!(plans[0].group_dimensions, vec![Dimension::Gender]);
        assert!(!plans[0].rollup);
        assert_eq!(
            plans[0].pinned,
            vec![(Dimension::AgeBucket, Label::Age(AgeBucket::EighteenToTwenty))]
        );
    }

    #[test]
    fn single_axis_reports_switch_on_age_filter() {
        for report in [ReportType::SocialMediaImpact, ReportType::AddictionTrend] {
            let grouped = &plan(report, &predicate("Female", "All"))[0];
            assert_eq!(grouped.group_dimensions, vec![Dimension::AgeBucket]);
            assert!(grouped.rollup);
            assert_eq!(
                grouped.pinned,
                vec![(Dimension::Gender, Label::Gender(Gender::Female))]
            );

            let narrowed = &plan(report, &predicate("Female", "24+"))[0];
            assert!(narrowed.group_dimensions.is_empty());
            assert!(!narrowed.rollup);
        }
    }

    #[test]
    fn indicators_never_group() {
        let plans = plan(ReportType::MentalHealthIndicators, &predicate("All", "All"));
        assert!(plans[0].group_dimensions.is_empty());
        assert!(!plans[0].rollup);
        assert_eq!(plans[0].measures.len(), 4);
    }

    #[test]
    fn comparison_plans_both_axes() {
        let plans = plan(ReportType::GenderAgeComparison, &predicate("All", "All"));
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].group_dimensions, vec![Dimension::Gender]);
        assert!(plans[0].rollup);
        assert_eq!(plans[1].group_dimensions, vec![Dimension::AgeBucket]);
        assert!(plans[1].rollup);

        let narrowed = plan(ReportType::GenderAgeComparison, &predicate("All", "21–23"));
        assert_eq!(narrowed[0].group_dimensions, vec![Dimension::Gender]);
        assert!(!narrowed[0].rollup);
        assert!(narrowed[1].group_dimensions.is_empty());
        assert!(!narrowed[1].rollup);
    }
}
