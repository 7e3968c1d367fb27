//! Fire-and-forget adjustment scheduling.

use std::sync::Arc;
use std::thread;

use tracing::{error, info};

use ledgerpost_core::{LedgerError, LedgerResult};
use ledgerpost_journal::{AdjustmentJob, AdjustmentScheduler};

type AdjustmentHandler = dyn Fn(&AdjustmentJob) -> anyhow::Result<()> + Send + Sync;

/// Runs each submitted adjustment job on its own thread. The submitting
/// call never awaits the outcome; handler failures are logged on the job's
/// own error channel.
pub struct ThreadAdjustmentScheduler {
    handler: Arc<AdjustmentHandler>,
}

impl ThreadAdjustmentScheduler {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&AdjustmentJob) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl AdjustmentScheduler for ThreadAdjustmentScheduler {
    fn submit(&self, job: AdjustmentJob) -> LedgerResult<()> {
        let handler = Arc::clone(&self.handler);
        thread::Builder::new()
            .name("tb-adjustment".to_string())
            .spawn(move || {
                info!(period_id = %job.period_id, "running trial balance adjustment");
                if let Err(err) = handler(&job) {
                    error!(period_id = %job.period_id, %err, "trial balance adjustment failed");
                }
            })
            .map_err(|e| LedgerError::infrastructure(format!("spawn adjustment worker: {e}")))?;
        Ok(())
    }
}

impl core::fmt::Debug for ThreadAdjustmentScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThreadAdjustmentScheduler").finish_non_exhaustive()
    }
}
