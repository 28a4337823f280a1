// Live mediator counters — lease churn, platform acquisitions, grants and timeouts.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediatorStats {
    pub active_leases: u64,
    pub leases_opened: u64,
    pub leases_closed: u64,
    pub acquisitions: u64,
    pub releases: u64,
    pub grants: u64,
    pub losses: u64,
    pub await_timeouts: u64,
}

#[derive(Default)]
pub struct StatsCollector {
    leases_opened: AtomicU64,
    leases_closed: AtomicU64,
    acquisitions: AtomicU64,
    releases: AtomicU64,
    grants: AtomicU64,
    losses: AtomicU64,
    await_timeouts: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_lease_opened(&self) {
        self.leases_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lease_closed(&self) {
        self.leases_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_acquisition(&self) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_grant(&self) {
        self.grants.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_loss(&self) {
        self.losses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.await_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MediatorStats {
        let leases_opened = self.leases_opened.load(Ordering::Relaxed);
        let leases_closed = self.leases_closed.load(Ordering::Relaxed);
        MediatorStats {
            active_leases: leases_opened.saturating_sub(leases_closed),
            leases_opened,
            leases_closed,
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            grants: self.grants.load(Ordering::Relaxed),
            losses: self.losses.load(Ordering::Relaxed),
            await_timeouts: self.await_timeouts.load(Ordering::Relaxed),
        }
    }
}
