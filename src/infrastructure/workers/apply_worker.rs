use crate::application::ApplyJob;
use crate::domain::errors::{DomainError, DomainResult};
use crate::ports::{ApplyJobDispatcher, LedgerPort, OrderStorePort};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

/// Queues apply runs for [`ApplyWorker`]
#[derive(Clone)]
pub struct ChannelApplyDispatcher {
    tx: mpsc::UnboundedSender<()>,
}

impl ApplyJobDispatcher for ChannelApplyDispatcher {
    fn dispatch(&self) -> DomainResult<()> {
        self.tx
            .send(())
            .map_err(|_| DomainError::InternalError("apply worker is not running".to_string()))
    }
}

/// Dispatcher and the receiving end its worker consumes
pub fn apply_channel() -> (ChannelApplyDispatcher, mpsc::UnboundedReceiver<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelApplyDispatcher { tx }, rx)
}

/// Runs the apply job once per request, one run at a time
pub struct ApplyWorker<L: LedgerPort, O: OrderStorePort> {
    job: Arc<ApplyJob<L, O>>,
    requests: mpsc::UnboundedReceiver<()>,
}

impl<L: LedgerPort, O: OrderStorePort> ApplyWorker<L, O> {
    pub fn new(job: Arc<ApplyJob<L, O>>, requests: mpsc::UnboundedReceiver<()>) -> Self {
        Self { job, requests }
    }

    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("apply worker started");

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("apply worker stopping");
                        break;
                    }
                }
                request = self.requests.recv() => {
                    if request.is_none() {
                        debug!("apply channel closed");
                        break;
                    }

                    // requests queued meanwhile are served by this same run
                    let mut coalesced = 0;
                    while self.requests.try_recv().is_ok() {
                        coalesced += 1;
                    }
                    if coalesced > 0 {
                        debug!(coalesced, "coalesced queued apply requests");
                    }

                    if let Err(e) = self.job.run().await {
                        error!(error = %e, "apply job run failed");
                    }
                }
            }
        }

        info!("apply worker stopped");
    }
}
