// Caller-held handle for one outstanding high-bandwidth request.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::bucket::GrantStatus;
use super::mediator::MediatorCore;
use crate::request::{HighBandwidthRequest, TransportSet};

/// One caller's interest in a high-bandwidth network.
///
/// The platform request stays active while at least one lease for the same
/// transport set is open. `close` is idempotent and dropping the lease closes it.
pub struct Lease {
    core: Arc<MediatorCore>,
    request: HighBandwidthRequest,
    closed: AtomicBool,
}

impl Lease {
    pub(crate) fn new(core: Arc<MediatorCore>, request: HighBandwidthRequest) -> Self {
        Self {
            core,
            request,
            closed: AtomicBool::new(false),
        }
    }

    pub fn request(&self) -> &HighBandwidthRequest {
        &self.request
    }

    pub fn transports(&self) -> TransportSet {
        self.request.transports()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Wait until the platform grants a network for this lease's transport set.
    ///
    /// Returns `false` if `timeout` elapses first, if the lease is closed, or
    /// immediately if the bucket has already been waiting longer than the
    /// configured grace window.
    pub async fn await_granted(&self, timeout: Duration) -> bool {
        if self.is_closed() {
            return false;
        }
        let transports = self.transports();
        let mut grants = self.core.subscribe_grants();

        match self.core.grant_status(transports) {
            GrantStatus::Granted => return true,
            GrantStatus::Expired => {
                debug!("{} already waited past the grace window, not waiting", self.request);
                self.core.stats.record_timeout();
                return false;
            }
            GrantStatus::Pending => {}
        }

        let index = transports.index();
        let granted = tokio::time::timeout(timeout, async move {
            grants.wait_for(|g| g[index].is_some()).await.is_ok()
        })
        .await
        .unwrap_or(false);

        if !granted {
            debug!("{} not granted within {:?}", self.request, timeout);
            self.core.stats.record_timeout();
        }
        granted
    }

    /// Release this lease. Only the first call has any effect.
    pub fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        self.core.close_lease(&self.request);
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Lease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("request", &self.request)
            .field("closed", &self.is_closed())
            .finish()
    }
}
