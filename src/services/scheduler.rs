use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::services::reminder_service::ReminderService;

/// Registers the periodic reminder scan and starts the scheduler. The
/// returned handle must be kept alive for the job to keep firing.
pub async fn start_reminder_job(service: ReminderService, schedule: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| Error::Scheduler(format!("{:?}", e)))?;

    let job = Job::new_async(schedule, move |_id, _scheduler| {
        let service = service.clone();
        Box::pin(async move {
            match service.run_once().await {
                Ok(Some(report)) => report.log(),
                Ok(None) => warn!("previous reminder run still in progress, skipping"),
                Err(e) => error!(error = %e, "reminder run aborted"),
            }
        })
    })
    .map_err(|e| Error::Scheduler(format!("invalid schedule {:?}: {:?}", schedule, e)))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| Error::Scheduler(format!("{:?}", e)))?;
    scheduler
        .start()
        .await
        .map_err(|e| Error::Scheduler(format!("{:?}", e)))?;

    info!(schedule, "reminder scan scheduled");
    Ok(scheduler)
}
