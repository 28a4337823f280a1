// Id-keyed lease registry — lets callers across an FFI boundary hold leases by number.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use tracing::debug;

use super::logging::init_tracing;
use crate::engine::lease::Lease;
use crate::engine::mediator::HighBandwidthMediator;
use crate::request::{HighBandwidthRequest, NetworkType};

type LeaseMap = Arc<RwLock<HashMap<u64, Arc<Lease>>>>;

pub struct LeaseRegistry {
    mediator: HighBandwidthMediator,
    leases: LeaseMap,
    next_id: AtomicU64,
}

impl LeaseRegistry {
    /// Wrap a mediator for bridge callers. Installs logging on first use.
    pub fn new(mediator: HighBandwidthMediator) -> Self {
        init_tracing();
        Self {
            mediator,
            leases: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn mediator(&self) -> &HighBandwidthMediator {
        &self.mediator
    }

    /// Open a lease for the given transports and return its id.
    pub fn request_network(&self, wifi: bool, cell: bool) -> Result<u64> {
        let request = HighBandwidthRequest::new(wifi, cell)?;
        Ok(self.request(request))
    }

    pub fn request(&self, request: HighBandwidthRequest) -> u64 {
        let lease = self.mediator.request_high_bandwidth_network(request);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.leases.write().insert(id, Arc::new(lease));
        debug!("registry opened lease {} for {}", id, request);
        id
    }

    /// Wait for the lease's network to be granted. Unknown ids are an error.
    pub async fn await_granted(&self, lease_id: u64, timeout: Duration) -> Result<bool> {
        let lease = self
            .leases
            .read()
            .get(&lease_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown lease {}", lease_id))?;
        Ok(lease.await_granted(timeout).await)
    }

    /// Close a lease. Releasing an unknown or already released id does nothing.
    pub fn release_network(&self, lease_id: u64) {
        let lease = self.leases.write().remove(&lease_id);
        match lease {
            Some(lease) => {
                lease.close();
                debug!("registry released lease {}", lease_id);
            }
            None => debug!("registry release of unknown lease {}", lease_id),
        }
    }

    pub fn pinned_networks(&self) -> Vec<NetworkType> {
        self.mediator.pinned_now().to_vec()
    }

    pub fn preferred_network(&self) -> Option<NetworkType> {
        self.mediator.pinned_now().preferred()
    }

    pub fn active_lease_count(&self) -> usize {
        self.leases.read().len()
    }

    /// Close every registered lease and flush delayed releases.
    pub fn dispose(&self) {
        let leases: Vec<Arc<Lease>> = self.leases.write().drain().map(|(_, lease)| lease).collect();
        for lease in &leases {
            lease.close();
        }
        self.mediator.flush_pending_releases();
        debug!("registry disposed {} leases", leases.len());
    }
}
