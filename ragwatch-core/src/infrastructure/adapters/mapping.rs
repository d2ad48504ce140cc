// ragwatch-core/src/infrastructure/adapters/mapping.rs
//
// Wire rows -> canonical records. Upstream field casing is not stable
// (PascalCase from the statistics API, camelCase from GraphQL), so objects
// are matched on lower-cased keys.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::entity::time;
use crate::domain::entity::{DataMetric, JobRun};

/// One row of `GET /api/JobStats`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatsRow {
    #[serde(rename = "businessentity")]
    pub business_entity: String,
    #[serde(rename = "jobstart", deserialize_with = "time::timestamp")]
    pub job_start: NaiveDateTime,
    #[serde(rename = "jobend", deserialize_with = "time::timestamp")]
    pub job_end: NaiveDateTime,
    #[serde(rename = "jobstatus", default)]
    pub job_status: String,
    #[serde(rename = "qualitystatus", default)]
    pub quality_status: String,
    #[serde(rename = "recordasofdate", deserialize_with = "time::date")]
    pub record_as_of_date: NaiveDate,
    #[serde(rename = "recordloaded", default)]
    pub record_loaded: i64,
    #[serde(rename = "recordfailed", default)]
    pub record_failed: i64,
}

impl From<JobStatsRow> for JobRun {
    fn from(row: JobStatsRow) -> Self {
        JobRun {
            business_entity: row.business_entity,
            job_start: row.job_start,
            job_end: row.job_end,
            job_status: row.job_status,
            quality_status: row.quality_status,
            record_as_of_date: row.record_as_of_date,
            record_loaded: non_negative(row.record_loaded),
            record_failed: non_negative(row.record_failed),
            message: None,
        }
    }
}

/// One row of the GraphQL `dataLoadMatrix` field.
#[derive(Debug, Clone, Deserialize)]
pub struct DataLoadMatrixRow {
    #[serde(default)]
    pub count: i64,
    #[serde(rename = "effectivedate", default, deserialize_with = "time::optional_date")]
    pub effective_date: Option<NaiveDate>,
    #[serde(rename = "entitykey", default)]
    pub entity_key: Option<String>,
}

/// A `null` body is an empty result.
pub fn decode_job_stats(body: Value) -> Result<Vec<JobRun>, serde_json::Error> {
    if body.is_null() {
        return Ok(Vec::new());
    }
    let rows: Vec<JobStatsRow> = serde_json::from_value(lowercase_keys(body))?;
    Ok(rows.into_iter().map(JobRun::from).collect())
}

/// Extracts `dataLoadMatrix` from a GraphQL `data` member.
pub fn decode_data_load_matrix(data: &Value) -> Result<Vec<DataLoadMatrixRow>, serde_json::Error> {
    let field = match data {
        Value::Object(map) => map
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("dataLoadMatrix"))
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null),
        _ => Value::Null,
    };
    if field.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(lowercase_keys(field))
}

/// Rows are credited to the queried key; the row's own `entityKey` only
/// fills in when the query was unfiltered.
pub fn metric_from_row(queried_key: Option<&str>, row: DataLoadMatrixRow) -> DataMetric {
    let entity_key = queried_key
        .map(str::to_string)
        .or(row.entity_key)
        .unwrap_or_default();
    DataMetric {
        entity_key,
        count: non_negative(row.count),
        date: row.effective_date,
        message: String::new(),
    }
}

/// Folds a metric into the run shape the rule engine understands. A healthy
/// metric reads as one successful, quality-passed load of `count` records.
pub fn run_from_metric(
    business_entity: &str,
    metric: &DataMetric,
    requested_at: NaiveDateTime,
    fallback_as_of: NaiveDate,
) -> JobRun {
    let as_of = metric.date.unwrap_or(fallback_as_of);
    if metric.is_degraded() {
        return JobRun::degraded(business_entity, requested_at, as_of, metric.message.clone());
    }
    let stamp = as_of.and_time(NaiveTime::MIN);
    JobRun {
        business_entity: business_entity.to_string(),
        job_start: stamp,
        job_end: stamp,
        job_status: "Success".to_string(),
        quality_status: "Pass".to_string(),
        record_as_of_date: as_of,
        record_loaded: metric.count,
        record_failed: 0,
        message: None,
    }
}

pub(crate) fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), lowercase_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

fn non_negative(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_stats_fields_are_case_insensitive() {
        let body = json!([
            {
                "Id": "5f0c8a4e-0000-0000-0000-000000000000",
                "BusinessEntity": "FX Rate",
                "JobStart": "2025-03-13T09:00:00",
                "JobEnd": "2025-03-13T09:30:00",
                "JobStatus": "Success",
                "QualityStatus": "Pass",
                "RecordAsOfDate": "2025-03-12T00:00:00",
                "RecordLoaded": 120,
                "RecordFailed": 0
            },
            {
                "businessEntity": "Securities",
                "jobStart": "2025-03-13T10:00:00Z",
                "jobEnd": "2025-03-13T10:05:00Z",
                "jobStatus": "Fail",
                "qualityStatus": "Fail",
                "recordAsOfDate": "2025-03-12",
                "recordLoaded": -3
            }
        ]);

        let runs = decode_job_stats(body).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].business_entity, "FX Rate");
        assert_eq!(runs[0].record_loaded, 120);
        assert_eq!(runs[0].record_as_of_date, NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());
        assert_eq!(runs[1].job_status, "Fail");
        assert_eq!(runs[1].record_loaded, 0);
        assert_eq!(runs[1].record_failed, 0);
    }

    #[test]
    fn test_null_bodies_are_empty() {
        assert!(decode_job_stats(Value::Null).unwrap().is_empty());
        assert!(decode_data_load_matrix(&json!({"dataLoadMatrix": null})).unwrap().is_empty());
        assert!(decode_data_load_matrix(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_row_is_an_error() {
        let body = json!([{ "BusinessEntity": "FX", "JobStart": "soon" }]);
        assert!(decode_job_stats(body).is_err());
    }

    #[test]
    fn test_matrix_rows_become_metrics() {
        let data = json!({
            "dataLoadMatrix": [
                { "count": 42, "effectiveDate": "2025-03-12T00:00:00", "entityKey": "FXRATE" },
                { "count": 7 }
            ]
        });
        let rows = decode_data_load_matrix(&data).unwrap();
        let metrics: Vec<DataMetric> = rows
            .into_iter()
            .map(|r| metric_from_row(None, r))
            .collect();

        assert_eq!(metrics[0].entity_key, "FXRATE");
        assert_eq!(metrics[0].count, 42);
        assert_eq!(metrics[0].date, NaiveDate::from_ymd_opt(2025, 3, 12));
        assert_eq!(metrics[1].entity_key, "");
        assert!(metrics[1].date.is_none());
    }

    #[test]
    fn test_queried_key_wins_over_row_key() {
        let row = DataLoadMatrixRow {
            count: 1,
            effective_date: None,
            entity_key: Some("OTHER".into()),
        };
        assert_eq!(metric_from_row(Some("BENCHMARK"), row).entity_key, "BENCHMARK");
    }

    #[test]
    fn test_run_from_metric() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 13)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let fallback = at.date();

        let healthy = DataMetric {
            entity_key: "FXRATE".into(),
            count: 42,
            date: NaiveDate::from_ymd_opt(2025, 3, 12),
            message: String::new(),
        };
        let run = run_from_metric("FX Rate", &healthy, at, fallback);
        assert!(run.is_success() && run.passed_quality());
        assert_eq!(run.record_loaded, 42);
        assert_eq!(run.record_as_of_date, NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());

        let broken = DataMetric::degraded("FXRATE", "connection refused");
        let run = run_from_metric("FX Rate", &broken, at, fallback);
        assert!(run.is_degraded());
        assert_eq!(run.record_as_of_date, fallback);
        assert_eq!(run.message.as_deref(), Some("connection refused"));
    }
}
