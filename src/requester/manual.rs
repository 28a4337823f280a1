// In-memory requester — grants and losses are driven by the embedding layer (or a test).

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::traits::{NetworkEventListener, NetworkReference, NetworkRequester};
use crate::request::{HighBandwidthRequest, NetworkType, TransportSet};

struct LiveRequest {
    id: u64,
    request: HighBandwidthRequest,
    listener: Arc<dyn NetworkEventListener>,
}

#[derive(Default)]
struct ManualState {
    next_id: u64,
    live: Vec<LiveRequest>,
    history: Vec<HighBandwidthRequest>,
    released: usize,
}

/// A [`NetworkRequester`] with no platform behind it.
///
/// Every call to `request_network` is recorded; [`grant`](Self::grant) and
/// [`lose`](Self::lose) deliver notifications to the most recent live request
/// for a transport set.
#[derive(Default)]
pub struct ManualNetworkRequester {
    state: Arc<Mutex<ManualState>>,
    auto_grant: Option<NetworkType>,
}

impl ManualNetworkRequester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `network` synchronously inside every request whose transports allow it.
    pub fn with_auto_grant(network: NetworkType) -> Self {
        Self {
            state: Arc::default(),
            auto_grant: Some(network),
        }
    }

    /// Report `network` as available to the newest live request for `transports`.
    /// Returns `false` if no such request is live.
    pub fn grant(&self, transports: TransportSet, network: NetworkType) -> bool {
        match self.listener_for(transports) {
            Some(listener) => {
                listener.on_available(network);
                true
            }
            None => false,
        }
    }

    /// Report the granted network as lost for the newest live request for `transports`.
    pub fn lose(&self, transports: TransportSet) -> bool {
        match self.listener_for(transports) {
            Some(listener) => {
                listener.on_lost();
                true
            }
            None => false,
        }
    }

    /// Total number of platform requests ever made.
    pub fn request_count(&self) -> usize {
        self.state.lock().history.len()
    }

    /// Number of platform requests currently live (not yet released).
    pub fn active_count(&self) -> usize {
        self.state.lock().live.len()
    }

    pub fn release_count(&self) -> usize {
        self.state.lock().released
    }

    /// Every request made, in order.
    pub fn requests(&self) -> Vec<HighBandwidthRequest> {
        self.state.lock().history.clone()
    }

    pub fn active_requests(&self) -> Vec<HighBandwidthRequest> {
        self.state.lock().live.iter().map(|r| r.request).collect()
    }

    // The listener is called after the lock is dropped, so it may re-enter the requester.
    fn listener_for(&self, transports: TransportSet) -> Option<Arc<dyn NetworkEventListener>> {
        let state = self.state.lock();
        state
            .live
            .iter()
            .rev()
            .find(|r| r.request.transports() == transports)
            .map(|r| Arc::clone(&r.listener))
    }
}

impl NetworkRequester for ManualNetworkRequester {
    fn request_network(
        &self,
        request: &HighBandwidthRequest,
        listener: Arc<dyn NetworkEventListener>,
    ) -> Box<dyn NetworkReference> {
        let id = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.history.push(*request);
            state.live.push(LiveRequest {
                id,
                request: *request,
                listener: Arc::clone(&listener),
            });
            id
        };
        debug!("manual requester: request {} for {}", id, request);

        if let Some(network) = self.auto_grant {
            if request.transports().allows(network) {
                listener.on_available(network);
            }
        }

        Box::new(ManualReference {
            id,
            state: Arc::clone(&self.state),
        })
    }
}

struct ManualReference {
    id: u64,
    state: Arc<Mutex<ManualState>>,
}

impl NetworkReference for ManualReference {
    fn release(self: Box<Self>) {
        let mut state = self.state.lock();
        let before = state.live.len();
        state.live.retain(|r| r.id != self.id);
        if state.live.len() < before {
            state.released += 1;
            debug!("manual requester: released request {}", self.id);
        }
    }
}
