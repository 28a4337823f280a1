// Request mediator — reference-counts leases per transport set and drives the platform requester.

use std::sync::{Arc, Weak};

use anyhow::Result;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::bucket::{Acquire, Bucket, GrantStatus, Release};
use super::lease::Lease;
use super::pinned::PinnedNetworks;
use super::stats::{MediatorStats, StatsCollector};
use crate::config::MediatorConfig;
use crate::request::{HighBandwidthRequest, NetworkType, TransportSet};
use crate::requester::traits::{NetworkEventListener, NetworkReference, NetworkRequester};

/// Granted network per bucket, indexed by `TransportSet::index`.
pub(crate) type BucketGrants = [Option<NetworkType>; 3];

struct MediatorState {
    buckets: [Bucket; 3],
    /// Timer of the pending delayed release per bucket.
    release_timers: [Option<CancellationToken>; 3],
}

pub(crate) struct MediatorCore {
    requester: Arc<dyn NetworkRequester>,
    config: MediatorConfig,
    state: Mutex<MediatorState>,
    pinned_tx: watch::Sender<PinnedNetworks>,
    grants_tx: watch::Sender<BucketGrants>,
    pub(crate) stats: StatsCollector,
    shutdown_token: CancellationToken,
}

impl MediatorCore {
    fn open(self: &Arc<Self>, request: HighBandwidthRequest) -> Lease {
        let transports = request.transports();
        let acquire = {
            let mut state = self.state.lock();
            let index = transports.index();
            let acquire = state.buckets[index].acquire(Instant::now());
            if acquire == Acquire::Resumed {
                if let Some(timer) = state.release_timers[index].take() {
                    timer.cancel();
                }
            }
            acquire
        };
        self.stats.record_lease_opened();

        match acquire {
            Acquire::Start { generation } => self.start_acquisition(request, generation),
            Acquire::Resumed => {
                debug!("{} re-requested during release delay, keeping platform request", transports)
            }
            Acquire::Joined => debug!("lease for {} joined existing platform request", request),
        }

        Lease::new(Arc::clone(self), request)
    }

    fn start_acquisition(self: &Arc<Self>, request: HighBandwidthRequest, generation: u64) {
        let transports = request.transports();
        self.stats.record_acquisition();
        info!(
            "requesting high bandwidth network for {} (generation {})",
            request, generation
        );

        let listener: Arc<dyn NetworkEventListener> = Arc::new(BucketListener {
            core: Arc::downgrade(self),
            transports,
            generation,
        });
        // Called without the lock held: the requester may report a grant synchronously.
        let reference = self.requester.request_network(&request, listener);

        // The opening lease keeps the count above zero until `open` returns, so
        // the bucket is still on this generation.
        self.state.lock().buckets[transports.index()].attach(generation, reference);
    }

    pub(crate) fn close_lease(self: &Arc<Self>, request: &HighBandwidthRequest) {
        let transports = request.transports();
        let index = transports.index();
        let defer = !self.config.release_delay().is_zero();

        let (outcome, timer) = {
            let mut state = self.state.lock();
            let outcome = state.buckets[index].release(defer);
            let timer = match outcome {
                Release::Released(_) => {
                    self.publish(&state.buckets);
                    None
                }
                Release::Deferred { .. } => {
                    let timer = self.shutdown_token.child_token();
                    if let Some(previous) = state.release_timers[index].replace(timer.clone()) {
                        previous.cancel();
                    }
                    Some(timer)
                }
                Release::Held { .. } | Release::NotHeld => None,
            };
            (outcome, timer)
        };
        self.stats.record_lease_closed();

        match outcome {
            Release::Held { remaining } => {
                debug!("lease for {} closed, {} still outstanding", request, remaining)
            }
            Release::Released(reference) => self.release_reference(transports, reference),
            Release::Deferred { ticket } => {
                if let Some(timer) = timer {
                    self.schedule_release(transports, ticket, timer);
                }
            }
            Release::NotHeld => debug!("lease for {} closed on an empty bucket", request),
        }
    }

    fn schedule_release(self: &Arc<Self>, transports: TransportSet, ticket: u64, timer: CancellationToken) {
        let delay = self.config.release_delay();
        match Handle::try_current() {
            Ok(handle) => {
                debug!("{} idle, releasing in {:?}", transports, delay);
                let core = Arc::downgrade(self);
                handle.spawn(async move {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = timer.cancelled() => return,
                    }
                    if let Some(core) = core.upgrade() {
                        core.finish_release(transports, ticket);
                    }
                });
            }
            Err(_) => {
                debug!("no runtime for delayed release of {}, releasing now", transports);
                self.finish_release(transports, ticket);
            }
        }
    }

    fn finish_release(&self, transports: TransportSet, ticket: u64) {
        let index = transports.index();
        let reference = {
            let mut state = self.state.lock();
            match state.buckets[index].finish_release(ticket) {
                Some(reference) => {
                    state.release_timers[index] = None;
                    self.publish(&state.buckets);
                    reference
                }
                None => return,
            }
        };
        self.release_reference(transports, reference);
    }

    fn flush_pending_releases(&self) {
        let mut released = Vec::new();
        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            for (bucket, timer) in state.buckets.iter_mut().zip(state.release_timers.iter_mut()) {
                let Some(ticket) = bucket.pending_release() else {
                    continue;
                };
                if let Some(timer) = timer.take() {
                    timer.cancel();
                }
                if let Some(reference) = bucket.finish_release(ticket) {
                    released.push((bucket.transports(), reference));
                }
            }
            if !released.is_empty() {
                self.publish(&state.buckets);
            }
        }
        for (transports, reference) in released {
            self.release_reference(transports, reference);
        }
    }

    fn release_reference(&self, transports: TransportSet, reference: Option<Box<dyn NetworkReference>>) {
        self.stats.record_release();
        match reference {
            Some(reference) => {
                info!("releasing high bandwidth network for {}", transports);
                reference.release();
            }
            None => debug!(
                "{} released before its platform request was attached",
                transports
            ),
        }
    }

    fn on_available(&self, transports: TransportSet, generation: u64, network: NetworkType) {
        let mut state = self.state.lock();
        if state.buckets[transports.index()].granted(generation, network) {
            self.stats.record_grant();
            info!("{} granted {} network", transports, network);
            self.publish(&state.buckets);
        } else {
            debug!(
                "ignoring {} grant for {} generation {}",
                network, transports, generation
            );
        }
    }

    fn on_lost(&self, transports: TransportSet, generation: u64) {
        let mut state = self.state.lock();
        if state.buckets[transports.index()].lost(generation) {
            self.stats.record_loss();
            info!("{} lost its granted network", transports);
            self.publish(&state.buckets);
        } else {
            debug!("ignoring loss for {} generation {}", transports, generation);
        }
    }

    /// Republish grant state. Must be called with the state lock held.
    fn publish(&self, buckets: &[Bucket; 3]) {
        let grants: BucketGrants = std::array::from_fn(|i| buckets[i].granted_network());
        let pinned = PinnedNetworks::from_granted(grants.iter().flatten().copied());

        self.grants_tx.send_if_modified(|current| {
            if *current == grants {
                return false;
            }
            *current = grants;
            true
        });
        self.pinned_tx.send_if_modified(|current| {
            if *current == pinned {
                return false;
            }
            debug!("pinned networks now {:?}", pinned.to_vec());
            *current = pinned;
            true
        });
    }

    pub(crate) fn grant_status(&self, transports: TransportSet) -> GrantStatus {
        let state = self.state.lock();
        state.buckets[transports.index()].grant_status(Instant::now(), self.config.grace_window())
    }

    pub(crate) fn subscribe_grants(&self) -> watch::Receiver<BucketGrants> {
        self.grants_tx.subscribe()
    }
}

impl Drop for MediatorCore {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
        for bucket in self.state.get_mut().buckets.iter_mut() {
            if let Some(reference) = bucket.take_reference() {
                debug!("mediator dropped, releasing platform request for {}", bucket.transports());
                reference.release();
            }
        }
    }
}

/// Routes platform notifications for one acquisition back into the mediator.
struct BucketListener {
    core: Weak<MediatorCore>,
    transports: TransportSet,
    generation: u64,
}

impl NetworkEventListener for BucketListener {
    fn on_available(&self, network: NetworkType) {
        if let Some(core) = self.core.upgrade() {
            core.on_available(self.transports, self.generation, network);
        }
    }

    fn on_lost(&self) {
        if let Some(core) = self.core.upgrade() {
            core.on_lost(self.transports, self.generation);
        }
    }
}

/// Aggregates high-bandwidth network requests from independent callers.
///
/// Each distinct [`TransportSet`] has one bucket. The first lease in a bucket
/// starts a platform acquisition through the [`NetworkRequester`]; closing the
/// last lease releases it (immediately, or after `release_delay_ms`). Callers
/// observe the outcome through [`Lease::await_granted`] and
/// [`pinned`](Self::pinned).
///
/// Cloning is cheap and every clone drives the same buckets.
#[derive(Clone)]
pub struct HighBandwidthMediator {
    core: Arc<MediatorCore>,
}

impl HighBandwidthMediator {
    pub fn new(requester: Arc<dyn NetworkRequester>) -> Self {
        Self::build(requester, MediatorConfig::default())
    }

    pub fn with_config(requester: Arc<dyn NetworkRequester>, config: MediatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(requester, config))
    }

    fn build(requester: Arc<dyn NetworkRequester>, config: MediatorConfig) -> Self {
        let (pinned_tx, _) = watch::channel(PinnedNetworks::default());
        let (grants_tx, _) = watch::channel([None; 3]);
        let core = MediatorCore {
            requester,
            config,
            state: Mutex::new(MediatorState {
                buckets: TransportSet::ALL.map(Bucket::new),
                release_timers: [None, None, None],
            }),
            pinned_tx,
            grants_tx,
            stats: StatsCollector::new(),
            shutdown_token: CancellationToken::new(),
        };
        Self {
            core: Arc::new(core),
        }
    }

    /// Register interest in a high-bandwidth network. Never fails; whether a
    /// network was obtained is reported by [`Lease::await_granted`].
    pub fn request_high_bandwidth_network(&self, request: HighBandwidthRequest) -> Lease {
        self.core.open(request)
    }

    /// Stream of the currently pinned networks. New receivers see the latest value.
    pub fn pinned(&self) -> watch::Receiver<PinnedNetworks> {
        self.core.pinned_tx.subscribe()
    }

    pub fn pinned_now(&self) -> PinnedNetworks {
        self.core.pinned_tx.borrow().clone()
    }

    /// Complete every delayed release now instead of waiting for its timer.
    pub fn flush_pending_releases(&self) {
        self.core.flush_pending_releases();
    }

    pub fn stats(&self) -> MediatorStats {
        self.core.stats.snapshot()
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.core.config
    }
}
