use serde::Serialize;

use crate::models::{Dimension, GroupAggregate, Label, Measure};
use crate::plan::{ReportType, Section};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepStressRow {
    pub gender: String,
    pub age_group: String,
    pub sleep: f64,
    pub stress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub factor: &'static str,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactRow {
    pub level: String,
    pub addiction: f64,
    pub gpa: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderRow {
    pub gender: String,
    pub stress: f64,
    pub mental_health: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeRow {
    pub age_group: String,
    pub stress: f64,
    pub mental_health: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderAgeComparison {
    pub by_gender: Vec<GenderRow>,
    pub by_age: Vec<AgeRow>,
}

/// `addiction` carries the academic-pressure mean; the field name is part
/// of the consumer contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendRow {
    pub age_group: String,
    pub addiction: f64,
    pub mental_health: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    SleepStress(Vec<SleepStressRow>),
    MentalHealthIndicators(Vec<IndicatorRow>),
    SocialMediaImpact(Vec<ImpactRow>),
    GenderAgeComparison(GenderAgeComparison),
    AddictionTrend(Vec<TrendRow>),
}

impl Report {
    pub fn row_count(&self) -> usize {
        match self {
            Report::SleepStress(rows) => rows.len(),
            Report::MentalHealthIndicators(rows) => rows.len(),
            Report::SocialMediaImpact(rows) => rows.len(),
            Report::GenderAgeComparison(comparison) => {
                comparison.by_gender.len() + comparison.by_age.len()
            }
            Report::AddictionTrend(rows) => rows.len(),
        }
    }
}

/// Maps aggregated sections onto the consumer contract of `report`.
///
/// Rows missing any required measure are dropped, not zero-filled. This is
/// lossy: a group with incomplete data disappears from the output.
pub fn shape(report: ReportType, sections: Vec<Vec<GroupAggregate>>) -> Report {
    let mut sections = report
        .sections()
        .iter()
        .zip(sections)
        .map(|(section, rows)| complete_rows(section, rows));

    let mut next = || sections.next().unwrap_or_default();

    match report {
        ReportType::SleepStress => Report::SleepStress(
            next()
                .iter()
                .filter_map(|row| {
                    Some(SleepStressRow {
                        gender: gender_label(row),
                        age_group: age_label(row),
                        sleep: row.value(Measure::SleepDuration)?,
                        stress: row.value(Measure::StressLevel)?,
                    })
                })
                .collect(),
        ),
        ReportType::MentalHealthIndicators => {
            let rows = next();
            let row = rows.first();
            let value = |measure: Measure| row.and_then(|row| row.value(measure));
            Report::MentalHealthIndicators(vec![
                IndicatorRow {
                    factor: "Stress",
                    value: value(Measure::StressLevel),
                },
                IndicatorRow {
                    factor: "Mental Health",
                    value: value(Measure::MentalHealthScore),
                },
                IndicatorRow {
                    factor: "Addiction",
                    value: value(Measure::AddictedScore),
                },
                IndicatorRow {
                    factor: "PHQ-9 Score",
                    value: value(Measure::Phq9Score),
                },
            ])
        }
        ReportType::SocialMediaImpact => Report::SocialMediaImpact(
            next()
                .iter()
                .filter_map(|row| {
                    Some(ImpactRow {
                        level: age_label(row),
                        addiction: row.value(Measure::AddictedScore)?,
                        gpa: row.value(Measure::Cgpa)?,
                    })
                })
                .collect(),
        ),
        ReportType::GenderAgeComparison => {
            let by_gender = next()
                .iter()
                .filter_map(|row| {
                    Some(GenderRow {
                        gender: gender_label(row),
                        stress: row.value(Measure::StressLevel)?,
                        mental_health: row.value(Measure::MentalHealthScore)?,
                    })
                })
                .collect();
            let by_age = next()
                .iter()
                .filter_map(|row| {
                    Some(AgeRow {
                        age_group: age_label(row),
                        stress: row.value(Measure::StressLevel)?,
                        mental_health: row.value(Measure::MentalHealthScore)?,
                    })
                })
                .collect();
            Report::GenderAgeComparison(GenderAgeComparison { by_gender, by_age })
        }
        ReportType::AddictionTrend => Report::AddictionTrend(
            next()
                .iter()
                .filter_map(|row| {
                    Some(TrendRow {
                        age_group: age_label(row),
                        addiction: row.value(Measure::AcademicPressure)?,
                        mental_health: row.value(Measure::MentalHealthScore)?,
                    })
                })
                .collect(),
        ),
    }
}

fn complete_rows(section: &Section, rows: Vec<GroupAggregate>) -> Vec<GroupAggregate> {
    rows.into_iter()
        .filter(|row| section.required.iter().all(|m| row.value(*m).is_some()))
        .collect()
}

fn gender_label(row: &GroupAggregate) -> String {
    match row.label(Dimension::Gender) {
        Some(Label::Gender(gender)) => gender.as_str().to_string(),
        _ => "All".to_string(),
    }
}

fn age_label(row: &GroupAggregate) -> String {
    match row.label(Dimension::AgeBucket) {
        Some(Label::Age(bucket)) => bucket.as_str().to_string(),
        _ => "All Ages".to_string(),
    }
}
