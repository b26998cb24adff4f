// All-jobs drive: one job failing does not stop the others.

use super::job_runner::{JobResult, run_job};
use super::CancelFlag;
use crate::config::merged::MergedConfig;
use crate::error::StampError;

/// Run every job, collecting per-job results. Cancellation is observed
/// between jobs as well as between pages inside each job.
pub fn run_all_jobs(
    configs: &[MergedConfig],
    cancel: &CancelFlag,
) -> Vec<crate::error::Result<JobResult>> {
    configs
        .iter()
        .map(|config| {
            if cancel.is_cancelled() {
                Err(StampError::pipeline("cancelled before job start"))
            } else {
                run_job(config, cancel)
            }
        })
        .collect()
}
