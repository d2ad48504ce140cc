// ragwatch-core/src/infrastructure/strategies/synthetic.rs

use async_trait::async_trait;
use chrono::{NaiveTime, TimeDelta};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::entity::{BusinessEntity, JobRun};
use crate::error::RagwatchError;
use crate::infrastructure::strategies::metadata::parse_optional_metadata;
use crate::ports::source::{FetchContext, SourceStrategy, check_group};

pub const SYNTHETIC_SOURCE: &str = "Synthetic";

#[derive(Debug, Deserialize)]
struct SyntheticMetadata {
    #[serde(rename = "runsperentity", default = "default_runs")]
    runs_per_entity: usize,
    #[serde(default = "default_seed")]
    seed: u64,
}

impl Default for SyntheticMetadata {
    fn default() -> Self {
        Self {
            runs_per_entity: default_runs(),
            seed: default_seed(),
        }
    }
}

fn default_runs() -> usize {
    5
}

fn default_seed() -> u64 {
    42
}

/// Seeded fake job runs for offline demos. The same entity, seed and as-of
/// day always yield the same runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticStrategy;

impl SyntheticStrategy {
    pub fn new() -> Self {
        Self
    }

    fn generate(
        entity: &BusinessEntity,
        meta: &SyntheticMetadata,
        ctx: &FetchContext,
    ) -> Vec<JobRun> {
        let day = ctx.effective_as_of();
        let mut rng = StdRng::seed_from_u64(meta.seed ^ fnv1a(&entity.name));

        (0..meta.runs_per_entity)
            .map(|_| {
                let start_time =
                    NaiveTime::from_hms_opt(rng.gen_range(9..15), rng.gen_range(0..60), 0)
                        .unwrap_or(NaiveTime::MIN);
                let job_start = day.and_time(start_time);
                let job_end = job_start + TimeDelta::minutes(rng.gen_range(20..=60));
                let success = rng.gen_bool(0.7);

                JobRun {
                    business_entity: entity.name.clone(),
                    job_start,
                    job_end,
                    job_status: if success { "Success" } else { "Failure" }.to_string(),
                    quality_status: if success { "Pass" } else { "Fail" }.to_string(),
                    record_as_of_date: day,
                    record_loaded: if success { rng.gen_range(100..300) } else { 0 },
                    record_failed: if success { 0 } else { rng.gen_range(10..=100) },
                    message: None,
                }
            })
            .collect()
    }
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl SourceStrategy for SyntheticStrategy {
    fn name(&self) -> &str {
        SYNTHETIC_SOURCE
    }

    fn validate(&self, entities: &[BusinessEntity]) -> Result<(), RagwatchError> {
        for entity in entities {
            parse_optional_metadata::<SyntheticMetadata>(entity)?;
        }
        Ok(())
    }

    #[instrument(skip_all, fields(strategy = SYNTHETIC_SOURCE, entities = entities.len()))]
    async fn fetch_runs(
        &self,
        entities: &[BusinessEntity],
        ctx: &FetchContext,
    ) -> Result<Vec<JobRun>, RagwatchError> {
        check_group(SYNTHETIC_SOURCE, entities)?;
        if ctx.cancel.is_cancelled() {
            return Err(RagwatchError::Cancelled);
        }

        let mut runs = Vec::new();
        for entity in entities {
            let meta: SyntheticMetadata = parse_optional_metadata(entity)?;
            runs.extend(Self::generate(entity, &meta, ctx));
        }
        debug!(runs = runs.len(), "Generated synthetic runs");
        Ok(runs)
    }
}
