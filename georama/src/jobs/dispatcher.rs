//! Single-threaded cooperative job loop.

use std::time::Duration;

use sqlx::{Pool, Sqlite};
use tracing::{error, info};

use super::{
    descriptor, maps_create, maps_delete, maps_update, mosaic_create, mosaic_delete,
    transformation, JobError,
};
use crate::config::Settings;
use crate::db;
use crate::id::IdCodec;
use crate::layout::ArtifactLayout;
use crate::models::{Job, JobState, JobType};
use crate::search::SearchIndex;
use crate::toolchain::Toolchain;

/// Drains the job queue serially, in submission order.
///
/// One job runs at a time; every external-tool, database and index call
/// inside a processor is blocking from the loop's point of view. A failing
/// processor marks its job `FAILED` and never aborts the loop.
pub struct Dispatcher<T: Toolchain, S: SearchIndex> {
    pub(crate) pool: Pool<Sqlite>,
    pub(crate) toolchain: T,
    pub(crate) index: S,
    pub(crate) layout: ArtifactLayout,
    pub(crate) codec: IdCodec,
    pub(crate) settings: Settings,
}

impl<T: Toolchain, S: SearchIndex> Dispatcher<T, S> {
    pub fn new(pool: Pool<Sqlite>, toolchain: T, index: S, settings: &Settings) -> Self {
        Self {
            pool,
            toolchain,
            index,
            layout: ArtifactLayout::new(settings.paths.clone()),
            codec: IdCodec::new(&settings.templates),
            settings: settings.clone(),
        }
    }

    /// Runs the loop forever, sleeping `poll_interval` when the queue is
    /// empty or the queue itself is unreachable.
    pub async fn run(&self, poll_interval: Duration) {
        info!("job dispatcher started");
        loop {
            match self.run_once().await {
                Ok(true) => {}
                Ok(false) => tokio::time::sleep(poll_interval).await,
                Err(err) => {
                    error!(error = %err, "job queue unavailable");
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
    }

    /// Picks and processes the oldest waiting job.
    ///
    /// Returns whether a job was picked. The queue-level `Err` covers only
    /// failures talking to the job table itself; processor failures are
    /// recorded on the job row and reported as `Ok(true)`.
    pub async fn run_once(&self) -> Result<bool, sqlx::Error> {
        let Some(job) = db::jobs::oldest_not_started(&self.pool).await? else {
            return Ok(false);
        };
        db::jobs::set_state(&self.pool, job.id, JobState::InProgress).await?;
        info!(job_id = job.id, job_type = %job.job_type, "dispatching job");

        match self.dispatch(&job).await {
            Ok(()) => {
                db::jobs::set_state(&self.pool, job.id, JobState::Completed).await?;
                info!(job_id = job.id, "job completed");
            }
            Err(err) => {
                error!(job_id = job.id, error = %err, "job failed");
                db::jobs::set_failed(&self.pool, job.id, &format!("{}: {}", err.class(), err))
                    .await?;
            }
        }
        Ok(true)
    }

    async fn dispatch(&self, job: &Job) -> Result<(), JobError> {
        match job.job_type {
            JobType::MapsCreate => {
                maps_create::process(self, &descriptor::parse(&job.descriptor)?).await
            }
            JobType::MapsUpdate => {
                maps_update::process(self, &descriptor::parse(&job.descriptor)?).await
            }
            JobType::MapsDelete => {
                maps_delete::process(self, &descriptor::parse(&job.descriptor)?).await
            }
            JobType::TransformationSet | JobType::TransformationProcess => {
                transformation::process(self, &descriptor::parse(&job.descriptor)?).await
            }
            JobType::MosaicMapCreate => {
                mosaic_create::process(self, &descriptor::parse(&job.descriptor)?).await
            }
            JobType::MosaicMapDelete => {
                mosaic_delete::process(self, &descriptor::parse(&job.descriptor)?).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::test_support::dispatcher_in as dispatcher;
    use crate::models::JobType;

    #[tokio::test]
    async fn test_empty_queue_reports_idle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dispatcher(dir.path()).await;
        assert!(!d.run_once().await.expect("poll"));
    }

    #[tokio::test]
    async fn test_malformed_descriptor_fails_job_and_records_class() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dispatcher(dir.path()).await;
        let id = db::jobs::insert(&d.pool, "user", JobType::MapsDelete, "{broken")
            .await
            .expect("insert");

        assert!(d.run_once().await.expect("poll"));
        let job = db::jobs::by_id(&d.pool, id)
            .await
            .expect("query")
            .expect("job");
        assert_eq!(job.state, JobState::Failed);
        assert!(job.error.expect("error").starts_with("DescriptorError"));
    }

    #[tokio::test]
    async fn test_jobs_drain_in_submission_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dispatcher(dir.path()).await;
        let first = db::jobs::insert(&d.pool, "user", JobType::MapsDelete, r#"{"map_id": 1}"#)
            .await
            .expect("insert");
        let second = db::jobs::insert(&d.pool, "user", JobType::MapsDelete, r#"{"map_id": 2}"#)
            .await
            .expect("insert");

        assert!(d.run_once().await.expect("poll"));
        let job = db::jobs::by_id(&d.pool, first)
            .await
            .expect("query")
            .expect("job");
        // no such map: the delete is a no-op and the job completes
        assert_eq!(job.state, JobState::Completed);
        let job = db::jobs::by_id(&d.pool, second)
            .await
            .expect("query")
            .expect("job");
        assert_eq!(job.state, JobState::NotStarted);

        assert!(d.run_once().await.expect("poll"));
        assert!(!d.run_once().await.expect("poll"));
    }
}
