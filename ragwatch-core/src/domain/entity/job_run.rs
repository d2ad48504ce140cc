// ragwatch-core/src/domain/entity/job_run.rs

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::entity::time;

/// Canonical execution record of a data-load job.
///
/// Statuses are kept as the upstream text ("Success", "Fail", "Failure"...)
/// because rule expressions compare them as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRun {
    pub business_entity: String,
    #[serde(deserialize_with = "time::timestamp")]
    pub job_start: NaiveDateTime,
    #[serde(deserialize_with = "time::timestamp")]
    pub job_end: NaiveDateTime,
    pub job_status: String,
    pub quality_status: String,
    #[serde(deserialize_with = "time::date")]
    pub record_as_of_date: NaiveDate,
    #[serde(default)]
    pub record_loaded: u64,
    #[serde(default)]
    pub record_failed: u64,
    /// Diagnostic carried by degraded placeholder records only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobRun {
    pub fn is_success(&self) -> bool {
        self.job_status.eq_ignore_ascii_case("success")
    }

    pub fn passed_quality(&self) -> bool {
        self.quality_status.eq_ignore_ascii_case("pass")
    }

    /// Placeholder emitted when a source sub-query failed.
    pub fn is_degraded(&self) -> bool {
        self.message.is_some()
    }

    pub fn degraded(
        business_entity: impl Into<String>,
        at: NaiveDateTime,
        as_of: NaiveDate,
        message: impl Into<String>,
    ) -> Self {
        Self {
            business_entity: business_entity.into(),
            job_start: at,
            job_end: at,
            job_status: "Failure".to_string(),
            quality_status: "Fail".to_string(),
            record_as_of_date: as_of,
            record_loaded: 0,
            record_failed: 0,
            message: Some(message.into()),
        }
    }
}
