use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::aggregate::aggregate;
use crate::error::EngineError;
use crate::filter::{self, Predicate};
use crate::models::{FactRecord, FilterSelection};
use crate::plan::{plan, ReportType};
use crate::report::{shape, Report};
use crate::rollup::expand;
use crate::source::FactSource;

/// All five reports for one selection, computed over a single snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub sleep_stress: Report,
    pub mental_health_indicators: Report,
    pub social_media_impact: Report,
    pub gender_age_comparison: Report,
    pub addiction_trend: Report,
}

impl Dashboard {
    pub fn reports(&self) -> [(ReportType, &Report); 5] {
        [
            (ReportType::SleepStress, &self.sleep_stress),
            (ReportType::MentalHealthIndicators, &self.mental_health_indicators),
            (ReportType::SocialMediaImpact, &self.social_media_impact),
            (ReportType::GenderAgeComparison, &self.gender_age_comparison),
            (ReportType::AddictionTrend, &self.addiction_trend),
        ]
    }
}

/// Filter, plan, aggregate, roll up and shape one report.
pub fn compute_report(records: &[FactRecord], report: ReportType, predicate: &Predicate) -> Report {
    let filtered = predicate.apply(records);
    debug!(report = report.name(), matched = filtered.len(), "filtered fact records");

    let sections = plan(report, predicate)
        .iter()
        .map(|plan| expand(&filtered, aggregate(&filtered, plan), plan))
        .collect();
    shape(report, sections)
}

pub async fn run_report<S: FactSource>(
    source: &S,
    report: ReportType,
    selection: &FilterSelection,
) -> Result<Report, EngineError> {
    let predicate = filter::resolve(selection)?;
    let records = source.fetch_fact_records().await?;
    Ok(compute_report(&records, report, &predicate))
}

/// Runs the five reports concurrently and returns all of them or an error.
///
/// The selection is validated before the source is read. Dropping the
/// returned future stops the fan-in; reports not yet started are cancelled and
/// any already running finish on the blocking pool with their output discarded.
pub async fn run_dashboard<S: FactSource>(
    source: &S,
    selection: &FilterSelection,
) -> Result<Dashboard, EngineError> {
    let predicate = filter::resolve(selection)?;
    let records: Arc<[FactRecord]> = source.fetch_fact_records().await?.into();

    let dashboard = fan_out(Arc::clone(&records), predicate, compute_report).await?;

    info!(
        gender = %selection.gender,
        age_range = %selection.age_range,
        records = records.len(),
        "dashboard computed"
    );
    Ok(dashboard)
}

type ComputeFn = fn(&[FactRecord], ReportType, &Predicate) -> Report;

/// One blocking task per report over the shared snapshot. The first failure
/// wins and drops the set, aborting whatever has not started yet.
async fn fan_out(
    records: Arc<[FactRecord]>,
    predicate: Predicate,
    compute: ComputeFn,
) -> Result<Dashboard, EngineError> {
    let mut tasks = JoinSet::new();
    for report in ReportType::ALL {
        let records = Arc::clone(&records);
        tasks.spawn_blocking(move || {
            let output =
                panic::catch_unwind(AssertUnwindSafe(|| compute(&records, report, &predicate)));
            (report, output)
        });
    }

    let mut reports = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (report, output) = joined.map_err(|err| EngineError::ReportFailed {
            report: "dashboard",
            message: err.to_string(),
        })?;
        let output = output.map_err(|payload| EngineError::ReportFailed {
            report: report.name(),
            message: panic_message(payload.as_ref()),
        })?;
        debug!(report = report.name(), rows = output.row_count(), "report finished");
        reports.insert(report, output);
    }

    let mut take = |report: ReportType| {
        reports.remove(&report).ok_or_else(|| EngineError::ReportFailed {
            report: report.name(),
            message: "report task produced no result".to_string(),
        })
    };

    Ok(Dashboard {
        sleep_stress: take(ReportType::SleepStress)?,
        mental_health_indicators: take(ReportType::MentalHealthIndicators)?,
        social_media_impact: take(ReportType::SocialMediaImpact)?,
        gender_age_comparison: take(ReportType::GenderAgeComparison)?,
        addiction_trend: take(ReportType::AddictionTrend)?,
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "report computation panicked".to_string()
    }
}
