use std::path::{Path, PathBuf};

use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{info, warn};

use crate::error::EngineError;
use crate::models::{FactRecord, Gender};
use crate::source::FactSource;

const FACT_QUERY: &str = "SELECT gender, age::float8 AS age, \
     avg_sleep_duration::float8 AS avg_sleep_duration, \
     avg_stress_level::float8 AS avg_stress_level, \
     avg_mental_health_score::float8 AS avg_mental_health_score, \
     avg_addicted_score::float8 AS avg_addicted_score, \
     avg_phq9_score::float8 AS avg_phq9_score, \
     avg_cgpa::float8 AS avg_cgpa, \
     avg_academic_pressure::float8 AS avg_academic_pressure, \
     avg_sleep_hours_x::float8 AS avg_sleep_hours_x, \
     avg_work_study_hours::float8 AS avg_work_study_hours \
     FROM fact_student_summary";

/// One fact-table row before gender and age are validated.
///
/// Age is read as a float because exports write it as `19.0` as often as `19`.
#[derive(Debug, Clone, Deserialize)]
struct RawFactRow {
    gender: Option<String>,
    age: Option<f64>,
    avg_sleep_duration: Option<f64>,
    avg_stress_level: Option<f64>,
    avg_mental_health_score: Option<f64>,
    avg_addicted_score: Option<f64>,
    avg_phq9_score: Option<f64>,
    avg_cgpa: Option<f64>,
    avg_academic_pressure: Option<f64>,
    avg_sleep_hours_x: Option<f64>,
    avg_work_study_hours: Option<f64>,
}

impl RawFactRow {
    fn into_record(self) -> Option<FactRecord> {
        let gender = self.gender.as_deref().and_then(normalize_gender)?;
        let age = self.age.and_then(whole_years)?;

        Some(FactRecord {
            gender,
            age,
            sleep_duration: finite(self.avg_sleep_duration),
            stress_level: finite(self.avg_stress_level),
            mental_health_score: finite(self.avg_mental_health_score),
            addicted_score: finite(self.avg_addicted_score),
            phq9_score: finite(self.avg_phq9_score),
            cgpa: finite(self.avg_cgpa),
            academic_pressure: finite(self.avg_academic_pressure),
            sleep_hours_x: finite(self.avg_sleep_hours_x),
            work_study_hours: finite(self.avg_work_study_hours),
        })
    }
}

/// Truncates toward zero; negative and non-finite ages are unusable.
fn whole_years(age: f64) -> Option<u32> {
    if (0.0..=f64::from(u32::MAX)).contains(&age) {
        Some(age.trunc() as u32)
    } else {
        None
    }
}

/// `NaN` and infinities in a measure cell are treated as missing.
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite())
}

/// Case-insensitive, keyed on the first letter as the loaders normalise it.
pub fn normalize_gender(value: &str) -> Option<Gender> {
    match value.trim().chars().next()?.to_ascii_lowercase() {
        'm' => Some(Gender::Male),
        'f' => Some(Gender::Female),
        _ => None,
    }
}

fn collect_records(source: &str, rows: impl IntoIterator<Item = RawFactRow>) -> Vec<FactRecord> {
    let mut skipped = 0usize;
    let records: Vec<FactRecord> = rows
        .into_iter()
        .filter_map(|row| {
            let record = row.into_record();
            if record.is_none() {
                skipped += 1;
            }
            record
        })
        .collect();

    if skipped > 0 {
        warn!(source, skipped, "skipped rows with unrecognised gender or missing age");
    }
    info!(source, rows = records.len(), "loaded fact records");
    records
}

#[derive(Debug, Clone)]
pub struct PgFactSource {
    pool: PgPool,
}

impl PgFactSource {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, EngineError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|err| EngineError::source_unavailable("failed to connect to Postgres", err))?;
        Ok(Self { pool })
    }
}

impl FactSource for PgFactSource {
    async fn fetch_fact_records(&self) -> Result<Vec<FactRecord>, EngineError> {
        let rows = sqlx::query(FACT_QUERY)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| EngineError::source_unavailable("querying fact_student_summary", err))?;

        let mut raw = Vec::with_capacity(rows.len());
        for row in rows {
            raw.push(
                decode_row(&row)
                    .map_err(|err| EngineError::source_unavailable("decoding fact row", err))?,
            );
        }

        Ok(collect_records("postgres", raw))
    }
}

fn decode_row(row: &sqlx::postgres::PgRow) -> Result<RawFactRow, sqlx::Error> {
    Ok(RawFactRow {
        gender: row.try_get("gender")?,
        age: row.try_get("age")?,
        avg_sleep_duration: row.try_get("avg_sleep_duration")?,
        avg_stress_level: row.try_get("avg_stress_level")?,
        avg_mental_health_score: row.try_get("avg_mental_health_score")?,
        avg_addicted_score: row.try_get("avg_addicted_score")?,
        avg_phq9_score: row.try_get("avg_phq9_score")?,
        avg_cgpa: row.try_get("avg_cgpa")?,
        avg_academic_pressure: row.try_get("avg_academic_pressure")?,
        avg_sleep_hours_x: row.try_get("avg_sleep_hours_x")?,
        avg_work_study_hours: row.try_get("avg_work_study_hours")?,
    })
}

/// Reads a CSV export of the fact table; blank cells become null measures.
#[derive(Debug, Clone)]
pub struct CsvFactSource {
    path: PathBuf,
}

impl CsvFactSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<FactRecord>, EngineError> {
        let context = format!("reading {}", self.path.display());
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|err| EngineError::source_unavailable(&context, err))?;

        let mut raw = Vec::new();
        for result in reader.deserialize::<RawFactRow>() {
            raw.push(result.map_err(|err| EngineError::source_unavailable(&context, err))?);
        }

        Ok(collect_records("csv", raw))
    }
}

impl FactSource for CsvFactSource {
    async fn fetch_fact_records(&self) -> Result<Vec<FactRecord>, EngineError> {
        // File I/O and parsing stay off the async workers.
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.read())
            .await
            .map_err(|err| EngineError::source_unavailable("CSV reader task", err))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "gender,age,avg_sleep_duration,avg_stress_level,avg_mental_health_score,\
avg_addicted_score,avg_phq9_score,avg_cgpa,avg_academic_pressure,avg_sleep_hours_x,avg_work_study_hours";

    fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn gender_normalization_matches_loader_rules() {
        assert_eq!(normalize_gender("male"), Some(Gender::Male));
        assert_eq!(normalize_gender(" F "), Some(Gender::Female));
        assert_eq!(normalize_gender("Female"), Some(Gender::Female));
        assert_eq!(normalize_gender("non-binary"), None);
        assert_eq!(normalize_gender(""), None);
    }

    #[tokio::test]
    async fn csv_source_reads_nullable_measures() {
        let file = write_csv(&[
            "Male,19,6.0,4.0,7,3,,3.1,2.5,,",
            "female,22,5.5,,6,4,9,2.9,3.0,7.0,5.0",
        ]);
        let records = CsvFactSource::new(file.path())
            .fetch_fact_records()
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].gender, Gender::Male);
        assert_eq!(records[0].stress_level, Some(4.0));
        assert_eq!(records[0].phq9_score, None);
        assert_eq!(records[1].gender, Gender::Female);
        assert_eq!(records[1].stress_level, None);
        assert_eq!(records[1].work_study_hours, Some(5.0));
    }

    #[tokio::test]
    async fn csv_source_skips_unusable_rows() {
        let file = write_csv(&[
            "Other,19,6.0,4.0,,,,,,,",
            "Male,,6.0,4.0,,,,,,,",
            "Male,-3,6.0,4.0,,,,,,,",
            "Female,17,6.0,4.0,,,,,,,",
        ]);
        let records = CsvFactSource::new(file.path())
            .fetch_fact_records()
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].age, 17);
    }

    #[tokio::test]
    async fn csv_source_accepts_float_formatted_ages() {
        let file = write_csv(&[
            "Male,19.0,6.0,4.0,,,,,,,",
            "Female,23.9,5.0,3.0,,,,,,,",
            "Female,-0.5,5.0,3.0,,,,,,,",
        ]);
        let records = CsvFactSource::new(file.path())
            .fetch_fact_records()
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].age, 19);
        assert_eq!(records[1].age, 23);
    }

    #[tokio::test]
    async fn csv_source_treats_non_finite_measures_as_null() {
        let file = write_csv(&["Male,20,NaN,inf,5.0,,,,,,"]);
        let records = CsvFactSource::new(file.path())
            .fetch_fact_records()
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sleep_duration, None);
        assert_eq!(records[0].stress_level, None);
        assert_eq!(records[0].mental_health_score, Some(5.0));
    }

    #[test]
    fn whole_years_rejects_unusable_ages() {
        assert_eq!(whole_years(19.0), Some(19));
        assert_eq!(whole_years(0.0), Some(0));
        assert_eq!(whole_years(-1.0), None);
        assert_eq!(whole_years(f64::NAN), None);
        assert_eq!(whole_years(f64::INFINITY), None);
    }

    #[tokio::test]
    async fn missing_csv_is_source_unavailable() {
        let err = CsvFactSource::new("/nonexistent/fact_student_summary.csv")
            .fetch_fact_records()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "DataSourceUnavailable");
    }

    #[tokio::test]
    async fn malformed_measure_is_source_unavailable() {
        let file = write_csv(&["Male,19,lots,4.0,,,,,,,"]);
        let err = CsvFactSource::new(file.path())
            .fetch_fact_records()
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::DataSourceUnavailable(_)));
    }
}
